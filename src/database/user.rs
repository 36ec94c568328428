use chrono::NaiveDate;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UserStats {
    pub user_id: i64,
    pub fullname: String,
    pub quiz_points: i64,
    pub streak: i64,
    pub last_active: Option<NaiveDate>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LeaderboardEntry {
    pub fullname: String,
    pub quiz_points: i64,
    pub streak: i64,
    pub books_read: i64,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReadBook {
    pub name: String,
    pub date: NaiveDate,
}

/// Streak after activity on `today`, given the previous activity day.
pub fn next_streak(last_active: Option<NaiveDate>, streak: i64, today: NaiveDate) -> i64 {
    match last_active {
        Some(last) if last == today => streak.max(1),
        Some(last) if last.succ_opt() == Some(today) => streak + 1,
        _ => 1,
    }
}
