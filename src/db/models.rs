use serde::{Deserialize, Serialize};
use sqlx::FromRow;

#[derive(Debug, Clone, FromRow, Serialize)]
pub struct User {
    pub id: i64,
    pub name: String,
    pub email: String,
    pub roll_no: String,
    pub department: String,
    pub phone: String,
    #[serde(skip_serializing)]
    pub password: String,
    pub created_at: i64,
    pub last_login: Option<i64>,
}

/// Public profile fields only. This is what the client session store keeps.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserProfile {
    pub id: i64,
    pub name: String,
    pub email: String,
    pub roll_no: String,
    pub department: String,
    pub phone: String,
}

impl From<&User> for UserProfile {
    fn from(user: &User) -> Self {
        UserProfile {
            id: user.id,
            name: user.name.clone(),
            email: user.email.clone(),
            roll_no: user.roll_no.clone(),
            department: user.department.clone(),
            phone: user.phone.clone(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
pub enum ComplaintStatus {
    #[sqlx(rename = "Pending")]
    Pending,
    #[serde(rename = "In Progress")]
    #[sqlx(rename = "In Progress")]
    InProgress,
    #[sqlx(rename = "Resolved")]
    Resolved,
}

#[derive(Debug, Clone, FromRow, Serialize)]
pub struct Complaint {
    pub id: i64,
    pub student_id: i64,
    pub title: String,
    pub category: String,
    pub description: String,
    pub status: ComplaintStatus,
    pub created_at: i64,
    pub updated_at: i64,
}

/// Listing row: complaint joined with the owning student's name and roll number.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct ComplaintWithStudent {
    pub id: i64,
    pub title: String,
    pub category: String,
    pub description: String,
    pub status: ComplaintStatus,
    pub created_at: i64,
    pub student_name: String,
    pub roll_no: String,
}
