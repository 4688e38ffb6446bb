use std::{fmt::Display, str::FromStr};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// The type used for primary keys in the database.
pub type PrimaryKey = i32;

/// Implements text conversion for enums stored as plain strings
macro_rules! text_enum {
    ($name:ident { $($variant:ident => $text:literal),+ $(,)? }) => {
        impl $name {
            pub fn as_str(&self) -> &'static str {
                match self {
                    $(Self::$variant => $text),+
                }
            }
        }

        impl FromStr for $name {
            type Err = UnknownVariant;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                match s {
                    $($text => Ok(Self::$variant),)+
                    other => Err(UnknownVariant(other.to_string())),
                }
            }
        }

        impl Display for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                f.write_str(self.as_str())
            }
        }
    };
}

#[derive(Debug, thiserror::Error)]
#[error("Unknown variant: {0}")]
pub struct UnknownVariant(pub String);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    #[default]
    User,
    Admin,
}

text_enum!(Role {
    User => "user",
    Admin => "admin",
});

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SubmissionStatus {
    Pending,
    Approved,
    Rejected,
}

text_enum!(SubmissionStatus {
    Pending => "pending",
    Approved => "approved",
    Rejected => "rejected",
});

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FriendshipStatus {
    Pending,
    Accepted,
    Declined,
}

text_enum!(FriendshipStatus {
    Pending => "pending",
    Accepted => "accepted",
    Declined => "declined",
});

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum InvitationStatus {
    Pending,
    Accepted,
    Declined,
    Expired,
}

text_enum!(InvitationStatus {
    Pending => "pending",
    Accepted => "accepted",
    Declined => "declined",
    Expired => "expired",
});

/// A trivia account
#[derive(Debug, Clone)]
pub struct UserData {
    pub id: PrimaryKey,
    pub username: String,
    /// The argon2 hash of the password, never the plain text
    pub password: String,
    pub role: Role,
    pub created_at: DateTime<Utc>,
}

impl UserData {
    pub fn is_admin(&self) -> bool {
        self.role == Role::Admin
    }
}

/// The playable part of a question, shared by questions and submissions
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QuestionContent {
    pub question: String,
    /// The options in the order they are presented
    pub options: Vec<String>,
    /// Must equal one of the options
    pub answer: String,
    pub category: Option<String>,
    pub difficulty: Option<String>,
    /// A reference to an image shown with the question
    pub image: Option<String>,
}

/// An approved quiz question
#[derive(Debug, Clone)]
pub struct QuestionData {
    pub id: PrimaryKey,
    pub content: QuestionContent,
    pub created_at: DateTime<Utc>,
}

/// A question submitted by a user, awaiting moderation
#[derive(Debug, Clone)]
pub struct SubmissionData {
    pub id: PrimaryKey,
    pub content: QuestionContent,
    pub submitter_id: PrimaryKey,
    pub submitter_username: String,
    pub status: SubmissionStatus,
    /// Feedback from the admin that moderated the submission
    pub feedback: Option<String>,
    pub created_at: DateTime<Utc>,
}

/// A player's score in a session
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScoreEntry {
    pub player_name: String,
    pub score: i64,
}

/// What kind of questions a session prefers
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionPreferences {
    pub difficulty: Option<String>,
    pub category: Option<String>,
}

/// A live quiz session
#[derive(Debug, Clone)]
pub struct SessionData {
    pub id: PrimaryKey,
    /// The short, human shareable code used to identify the session
    pub code: String,
    /// The initiator's name followed by the ids of joined users
    pub participants: Vec<String>,
    pub active: bool,
    /// Scores keyed by player name
    pub scores: Vec<ScoreEntry>,
    pub preferences: SessionPreferences,
    pub created_at: DateTime<Utc>,
}

impl SessionData {
    /// Adds the participant unless already present. Returns true if added.
    pub fn add_participant(&mut self, participant: &str) -> bool {
        if self.participants.iter().any(|p| p == participant) {
            return false;
        }

        self.participants.push(participant.to_string());
        true
    }

    /// Inserts or replaces the score of a player by exact name match
    pub fn upsert_score(&mut self, player_name: &str, score: i64) {
        match self
            .scores
            .iter_mut()
            .find(|entry| entry.player_name == player_name)
        {
            Some(entry) => entry.score = score,
            None => self.scores.push(ScoreEntry {
                player_name: player_name.to_string(),
                score,
            }),
        }
    }
}

/// A friendship edge, or a friend request while pending
#[derive(Debug, Clone)]
pub struct FriendshipData {
    pub id: PrimaryKey,
    /// The user that sent the request
    pub user1: PrimaryKey,
    /// The user that received the request
    pub user2: PrimaryKey,
    pub status: FriendshipStatus,
    pub created_at: DateTime<Utc>,
}

impl FriendshipData {
    pub fn involves(&self, user_id: PrimaryKey) -> bool {
        self.user1 == user_id || self.user2 == user_id
    }

    /// Returns the side of the edge that isn't `user_id`
    pub fn other_side(&self, user_id: PrimaryKey) -> PrimaryKey {
        if self.user1 == user_id {
            self.user2
        } else {
            self.user1
        }
    }
}

/// An invitation to join a quiz session
#[derive(Debug, Clone)]
pub struct InvitationData {
    pub id: PrimaryKey,
    pub sender_id: PrimaryKey,
    pub recipient_id: PrimaryKey,
    pub session_code: String,
    pub sender_username: String,
    pub recipient_username: String,
    pub status: InvitationStatus,
    pub created_at: DateTime<Utc>,
}

impl InvitationData {
    pub fn is_expired(&self, ttl: chrono::Duration) -> bool {
        Utc::now() - self.created_at >= ttl
    }
}

/// Filters questions, absent values or "all" mean no filter
#[derive(Debug, Clone, Default)]
pub struct QuestionFilter {
    pub difficulty: Option<String>,
    pub category: Option<String>,
}

impl QuestionFilter {
    pub fn difficulty(&self) -> Option<&str> {
        Self::effective(&self.difficulty)
    }

    pub fn category(&self) -> Option<&str> {
        Self::effective(&self.category)
    }

    pub fn matches(&self, content: &QuestionContent) -> bool {
        let difficulty_ok = self
            .difficulty()
            .map_or(true, |d| content.difficulty.as_deref() == Some(d));
        let category_ok = self
            .category()
            .map_or(true, |c| content.category.as_deref() == Some(c));

        difficulty_ok && category_ok
    }

    fn effective(value: &Option<String>) -> Option<&str> {
        value
            .as_deref()
            .map(str::trim)
            .filter(|v| !v.is_empty() && !v.eq_ignore_ascii_case("all"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn content(category: Option<&str>, difficulty: Option<&str>) -> QuestionContent {
        QuestionContent {
            question: "Capital of Norway?".to_string(),
            options: vec!["Oslo".to_string(), "Bergen".to_string()],
            answer: "Oslo".to_string(),
            category: category.map(String::from),
            difficulty: difficulty.map(String::from),
            image: None,
        }
    }

    #[test]
    fn test_filter_all_means_no_filter() {
        let filter = QuestionFilter {
            difficulty: Some("all".to_string()),
            category: Some("All".to_string()),
        };

        assert!(filter.matches(&content(None, None)), "all matches anything");
        assert!(
            filter.matches(&content(Some("geography"), Some("easy"))),
            "all matches anything"
        );
    }

    #[test]
    fn test_filter_by_category_and_difficulty() {
        let filter = QuestionFilter {
            difficulty: Some("easy".to_string()),
            category: Some("geography".to_string()),
        };

        assert!(filter.matches(&content(Some("geography"), Some("easy"))));
        assert!(!filter.matches(&content(Some("geography"), Some("hard"))));
        assert!(!filter.matches(&content(None, Some("easy"))));
    }

    #[test]
    fn test_upsert_score_by_name() {
        let mut session = SessionData {
            id: 1,
            code: "ABC234".to_string(),
            participants: vec!["alice".to_string()],
            active: true,
            scores: vec![],
            preferences: Default::default(),
            created_at: Utc::now(),
        };

        session.upsert_score("alice", 1);
        session.upsert_score("bob", 2);
        session.upsert_score("alice", 3);

        assert_eq!(
            session.scores,
            vec![
                ScoreEntry {
                    player_name: "alice".to_string(),
                    score: 3
                },
                ScoreEntry {
                    player_name: "bob".to_string(),
                    score: 2
                }
            ],
            "scores are upserted in place"
        );
    }

    #[test]
    fn test_text_enums_round_trip_through_str() {
        assert_eq!("admin".parse::<Role>().ok(), Some(Role::Admin));
        assert_eq!(InvitationStatus::Expired.as_str(), "expired");
        assert!("maybe".parse::<FriendshipStatus>().is_err());
    }
}
