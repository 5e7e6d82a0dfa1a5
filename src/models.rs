use mongodb::bson::{self, oid::ObjectId, spec::BinarySubtype, Binary};
use serde::{Deserialize, Serialize};

/// Shape version written into every stored record.
pub const SCHEMA_VERSION: u32 = 1;

const FALLBACK_CONTENT_TYPE: &str = "application/octet-stream";

/// The two kinds of uploaded media; each lives in its own collection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MediaKind {
    Sprite,
    Audio,
}

impl MediaKind {
    pub fn collection(&self) -> &'static str {
        match self {
            MediaKind::Sprite => "sprites",
            MediaKind::Audio => "audio",
        }
    }

    pub fn upload_message(&self) -> &'static str {
        match self {
            MediaKind::Sprite => "Sprite uploaded",
            MediaKind::Audio => "Audio file uploaded",
        }
    }
}

impl std::fmt::Display for MediaKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            MediaKind::Sprite => write!(f, "sprite"),
            MediaKind::Audio => write!(f, "audio file"),
        }
    }
}

/// Stored document for the `sprites` and `audio` collections.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MediaRecord {
    #[serde(rename = "_id", skip_serializing_if = "Option::is_none")]
    pub id: Option<ObjectId>,
    pub schema_version: u32,
    pub filename: String,
    pub content_type: String,
    pub size: i64,
    pub content: Binary,
    pub uploaded_at: bson::DateTime,
}

impl MediaRecord {
    pub fn new(filename: String, content_type: Option<String>, content: Vec<u8>) -> Self {
        let content_type = content_type
            .filter(|ct| !ct.is_empty())
            .unwrap_or_else(|| guess_content_type(&filename));

        Self {
            id: None,
            schema_version: SCHEMA_VERSION,
            filename,
            content_type,
            size: content.len() as i64,
            content: Binary {
                subtype: BinarySubtype::Generic,
                bytes: content,
            },
            uploaded_at: bson::DateTime::now(),
        }
    }

    pub fn bytes(&self) -> &[u8] {
        &self.content.bytes
    }
}

fn guess_content_type(filename: &str) -> String {
    mime_guess::from_path(filename)
        .first_raw()
        .unwrap_or(FALLBACK_CONTENT_TYPE)
        .to_string()
}

/// Score payload accepted by `POST /player_score`.
#[derive(Debug, Clone, Deserialize)]
pub struct PlayerScore {
    #[serde(alias = "player_name")]
    pub player: String,
    pub score: i64,
}

/// Stored document for the `scores` collection.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScoreRecord {
    #[serde(rename = "_id", skip_serializing_if = "Option::is_none")]
    pub id: Option<ObjectId>,
    pub schema_version: u32,
    pub player: String,
    pub score: i64,
    pub recorded_at: bson::DateTime,
}

impl From<PlayerScore> for ScoreRecord {
    fn from(score: PlayerScore) -> Self {
        Self {
            id: None,
            schema_version: SCHEMA_VERSION,
            player: score.player,
            score: score.score,
            recorded_at: bson::DateTime::now(),
        }
    }
}

#[derive(Debug, Serialize, Deserialize)]
pub struct InsertResponse {
    pub message: String,
    pub id: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct MediaSummary {
    pub id: Option<String>,
    pub filename: String,
    pub content_type: String,
    pub size: i64,
    /// base64url without padding
    pub content: String,
}

impl From<MediaRecord> for MediaSummary {
    fn from(record: MediaRecord) -> Self {
        Self {
            id: record.id.map(|id| id.to_hex()),
            content: base64_url::encode(record.bytes()),
            filename: record.filename,
            content_type: record.content_type,
            size: record.size,
        }
    }
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ScoreSummary {
    pub id: Option<String>,
    pub player: String,
    pub score: i64,
}

impl From<ScoreRecord> for ScoreSummary {
    fn from(record: ScoreRecord) -> Self {
        Self {
            id: record.id.map(|id| id.to_hex()),
            player: record.player,
            score: record.score,
        }
    }
}
