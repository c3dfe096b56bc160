use sqlx::{Pool, Sqlite};

use crate::db::models::{Complaint, ComplaintWithStudent};
use crate::error::AppError;

pub struct ComplaintRepository;

impl ComplaintRepository {
    pub async fn create(
        pool: &Pool<Sqlite>,
        student_id: i64,
        title: &str,
        category: &str,
        description: &str,
    ) -> Result<Complaint, AppError> {
        let now = chrono::Utc::now().timestamp();

        let complaint = sqlx::query_as::<_, Complaint>(
            r#"
INSERT INTO complaints (student_id, title, category, description, status, created_at, updated_at)
VALUES (?, ?, ?, ?, 'Pending', ?, ?)
RETURNING *
            "#,
        )
        .bind(student_id)
        .bind(title)
        .bind(category)
        .bind(description)
        .bind(now)
        .bind(now)
        .fetch_one(pool)
        .await?;

        Ok(complaint)
    }

    // Newest first; id breaks ties within the same second.
    pub async fn list_all(pool: &Pool<Sqlite>) -> Result<Vec<ComplaintWithStudent>, AppError> {
        let complaints = sqlx::query_as::<_, ComplaintWithStudent>(
            r#"
SELECT c.id, c.title, c.category, c.description, c.status, c.created_at,
       u.name AS student_name, u.roll_no
FROM complaints c
JOIN users u ON c.student_id = u.id
ORDER BY c.created_at DESC, c.id DESC
            "#,
        )
        .fetch_all(pool)
        .await?;

        Ok(complaints)
    }

    pub async fn list_for_student(
        pool: &Pool<Sqlite>,
        student_id: i64,
    ) -> Result<Vec<ComplaintWithStudent>, AppError> {
        let complaints = sqlx::query_as::<_, ComplaintWithStudent>(
            r#"
SELECT c.id, c.title, c.category, c.description, c.status, c.created_at,
       u.name AS student_name, u.roll_no
FROM complaints c
JOIN users u ON c.student_id = u.id
WHERE c.student_id = ?
ORDER BY c.created_at DESC, c.id DESC
            "#,
        )
        .bind(student_id)
        .fetch_all(pool)
        .await?;

        Ok(complaints)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::models::ComplaintStatus;
    use crate::db::UserRepository;
    use crate::test_support::test_pool;

    async fn insert_student(pool: &Pool<Sqlite>, email: &str, roll_no: &str, phone: &str) -> i64 {
        UserRepository::create(pool, "Test Student", email, roll_no, "CS", phone, "hash")
            .await
            .unwrap()
            .id
    }

    #[tokio::test]
    async fn create_defaults_to_pending() {
        let pool = test_pool().await;
        let student_id = insert_student(&pool, "a@example.com", "CS-001", "03001234567").await;

        let complaint = ComplaintRepository::create(
            &pool,
            student_id,
            "Broken projector",
            "Infrastructure",
            "The projector in room 12 is broken",
        )
        .await
        .unwrap();

        assert!(complaint.id > 0);
        assert_eq!(complaint.status, ComplaintStatus::Pending);
        assert_eq!(complaint.student_id, student_id);
        assert_eq!(complaint.created_at, complaint.updated_at);
    }

    #[tokio::test]
    async fn listing_joins_student_fields_and_orders_newest_first() {
        let pool = test_pool().await;
        let student_id = insert_student(&pool, "a@example.com", "CS-001", "03001234567").await;

        let first = ComplaintRepository::create(
            &pool,
            student_id,
            "First complaint",
            "General",
            "An older complaint text",
        )
        .await
        .unwrap();
        let second = ComplaintRepository::create(
            &pool,
            student_id,
            "Second complaint",
            "General",
            "A newer complaint text",
        )
        .await
        .unwrap();

        // Force distinct creation times; inserts above land in the same second.
        sqlx::query("UPDATE complaints SET created_at = created_at - 60 WHERE id = ?")
            .bind(first.id)
            .execute(&pool)
            .await
            .unwrap();

        let listed = ComplaintRepository::list_all(&pool).await.unwrap();
        assert_eq!(listed.len(), 2);
        assert_eq!(listed[0].id, second.id);
        assert_eq!(listed[1].id, first.id);
        assert_eq!(listed[0].student_name, "Test Student");
        assert_eq!(listed[0].roll_no, "CS-001");
    }

    #[tokio::test]
    async fn filtered_listing_returns_only_that_student() {
        let pool = test_pool().await;
        let alice = insert_student(&pool, "alice@example.com", "CS-001", "03001234567").await;
        let bob = insert_student(&pool, "bob@example.com", "CS-002", "03007654321").await;

        ComplaintRepository::create(&pool, alice, "Alice issue", "General", "Alice's complaint")
            .await
            .unwrap();
        ComplaintRepository::create(&pool, bob, "Bob issue", "General", "Bob's complaint")
            .await
            .unwrap();

        let filtered = ComplaintRepository::list_for_student(&pool, alice).await.unwrap();
        assert_eq!(filtered.len(), 1);
        assert_eq!(filtered[0].title, "Alice issue");

        let nobody = ComplaintRepository::list_for_student(&pool, 9999).await.unwrap();
        assert!(nobody.is_empty());
    }
}
