//! Per-user digest statistics.

use serde::Serialize;

use crate::database::models::ShareSummaryRow;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TypeCount {
    #[serde(rename = "type")]
    pub type_name: String,
    pub count: usize,
}

/// Notes received by one user, counted per note type.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UserStat {
    pub user_id: i64,
    pub email: String,
    pub username: String,
    pub stats: Vec<TypeCount>,
}

/// Fold flat `(user, type)` rows into per-user counts.
///
/// Users and, within a user, types keep the order in which they first appear.
pub fn summarize_user_notes(rows: &[ShareSummaryRow]) -> Vec<UserStat> {
    let mut stats: Vec<UserStat> = Vec::new();

    for row in rows {
        let idx = match stats.iter().position(|s| s.user_id == row.user_id) {
            Some(idx) => idx,
            None => {
                stats.push(UserStat {
                    user_id: row.user_id,
                    email: row.email.clone(),
                    username: row.username.clone(),
                    stats: Vec::new(),
                });
                stats.len() - 1
            }
        };

        let user = &mut stats[idx];
        match user.stats.iter_mut().find(|t| t.type_name == row.type_name) {
            Some(entry) => entry.count += 1,
            None => user.stats.push(TypeCount {
                type_name: row.type_name.clone(),
                count: 1,
            }),
        }
    }

    stats
}

pub fn format_stats_message(stat: &UserStat, call_to_action_url: Option<&str>) -> String {
    let mut lines = vec![
        format!("Hi {},", stat.username),
        "You got some new notes!".to_string(),
    ];
    lines.extend(
        stat.stats
            .iter()
            .map(|t| format!("{} {} notes", t.count, t.type_name)),
    );
    if let Some(url) = call_to_action_url {
        lines.push(format!("See all your notes: {}", url));
    }
    lines.join("\n")
}
