//! Message repository.

use std::sync::Arc;

use crate::entities::message::{self, ActiveModel, Column, Entity as Message};
use pictogram_common::{AppError, AppResult};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, Condition, DatabaseConnection, EntityTrait, QueryFilter,
    QueryOrder,
};

/// Repository for direct message operations.
#[derive(Clone)]
pub struct MessageRepository {
    db: Arc<DatabaseConnection>,
}

impl MessageRepository {
    /// Create a new message repository.
    #[must_use]
    pub const fn new(db: Arc<DatabaseConnection>) -> Self {
        Self { db }
    }

    /// Create a new message.
    pub async fn create(&self, model: ActiveModel) -> AppResult<message::Model> {
        model
            .insert(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Find all messages in a conversation between two users, oldest first.
    ///
    /// The view is symmetric: messages sent in either direction are included,
    /// so `find_conversation(a, b)` and `find_conversation(b, a)` return the
    /// same sequence.
    pub async fn find_conversation(
        &self,
        user_id: i64,
        partner_id: i64,
    ) -> AppResult<Vec<message::Model>> {
        Message::find()
            .filter(
                Condition::any()
                    .add(
                        Condition::all()
                            .add(Column::SenderId.eq(user_id))
                            .add(Column::ReceiverId.eq(partner_id)),
                    )
                    .add(
                        Condition::all()
                            .add(Column::SenderId.eq(partner_id))
                            .add(Column::ReceiverId.eq(user_id)),
                    ),
            )
            .order_by_asc(Column::CreatedAt)
            .order_by_asc(Column::Id)
            .all(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Get conversation partners for a user (users they've messaged or been
    /// messaged by).
    pub async fn find_conversation_partners(&self, user_id: i64) -> AppResult<Vec<i64>> {
        use sea_orm::{ConnectionTrait, Statement};

        let sql = r#"
            SELECT DISTINCT partner_id FROM (
                SELECT receiver_id AS partner_id FROM message
                WHERE sender_id = $1
                UNION
                SELECT sender_id AS partner_id FROM message
                WHERE receiver_id = $1
            ) AS partners
            ORDER BY partner_id
            "#;

        let result = self
            .db
            .query_all(Statement::from_sql_and_values(
                sea_orm::DatabaseBackend::Postgres,
                sql,
                [user_id.into()],
            ))
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;

        let mut partners = Vec::new();
        for row in result {
            if let Ok(partner_id) = row.try_get::<i64>("", "partner_id") {
                partners.push(partner_id);
            }
        }

        Ok(partners)
    }

    /// Find the latest message in a conversation.
    pub async fn find_latest_in_conversation(
        &self,
        user_id: i64,
        partner_id: i64,
    ) -> AppResult<Option<message::Model>> {
        Message::find()
            .filter(
                Condition::any()
                    .add(
                        Condition::all()
                            .add(Column::SenderId.eq(user_id))
                            .add(Column::ReceiverId.eq(partner_id)),
                    )
                    .add(
                        Condition::all()
                            .add(Column::SenderId.eq(partner_id))
                            .add(Column::ReceiverId.eq(user_id)),
                    ),
            )
            .order_by_desc(Column::CreatedAt)
            .order_by_desc(Column::Id)
            .one(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }
}
