use serde::{Deserialize, Deserializer, Serialize, Serializer};

/// Glob pattern matching every stored resume record.
pub const RESUME_KEY_PATTERN: &str = "resume:*";

/// Storage key for one resume record; derived solely from its id.
pub fn resume_key(id: &str) -> String {
    format!("resume:{id}")
}

/// One persisted analysis request: document handles, job context and the
/// eventual critique. Serialized as camelCase JSON under `resume:{id}`.
///
/// Everything except `feedback` is immutable once written; `feedback` moves
/// from pending to finalized exactly once and never reverts.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Resume {
    pub id: String,
    pub resume_path: String,
    pub image_path: String,
    pub company_name: String,
    pub job_title: String,
    pub job_description: String,
    pub feedback: FeedbackState,
}

impl Resume {
    pub fn storage_key(&self) -> String {
        resume_key(&self.id)
    }
}

/// The critique slot of a record. Stored as the empty string while the
/// analysis is still pending and as the full object once finalized, so both
/// states round-trip through the same key.
#[derive(Debug, Clone, Default, PartialEq)]
pub enum FeedbackState {
    #[default]
    Pending,
    Ready(Feedback),
}

impl FeedbackState {
    pub fn is_pending(&self) -> bool {
        matches!(self, FeedbackState::Pending)
    }

    pub fn as_ready(&self) -> Option<&Feedback> {
        match self {
            FeedbackState::Pending => None,
            FeedbackState::Ready(feedback) => Some(feedback),
        }
    }
}

impl Serialize for FeedbackState {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            FeedbackState::Pending => serializer.serialize_str(""),
            FeedbackState::Ready(feedback) => feedback.serialize(serializer),
        }
    }
}

impl<'de> Deserialize<'de> for FeedbackState {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        #[derive(Deserialize)]
        #[serde(untagged)]
        enum Repr {
            Ready(Feedback),
            Pending(String),
        }

        Ok(match Repr::deserialize(deserializer)? {
            Repr::Ready(feedback) => FeedbackState::Ready(feedback),
            Repr::Pending(_) => FeedbackState::Pending,
        })
    }
}

/// Structured critique, produced exactly once per resume.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Feedback {
    pub overall_score: u8,
    pub tone_and_style: CategoryFeedback,
    pub content: CategoryFeedback,
    pub structure: CategoryFeedback,
    pub skills: CategoryFeedback,
}

/// One scored dimension of the critique. For the `skills` category the tips
/// describe the candidate's skill gaps and feed the study-plan generator.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct CategoryFeedback {
    pub score: u8,
    pub tips: Vec<Tip>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Tip {
    #[serde(rename = "type")]
    pub kind: TipKind,
    pub tip: String,
    pub explanation: String,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum TipKind {
    Good,
    Improve,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_feedback() -> Feedback {
        Feedback {
            overall_score: 82,
            tone_and_style: CategoryFeedback {
                score: 85,
                tips: vec![Tip {
                    kind: TipKind::Good,
                    tip: "Consistent voice".to_string(),
                    explanation: "Bullets keep an active, first-person-implied voice".to_string(),
                }],
            },
            content: CategoryFeedback {
                score: 78,
                tips: vec![],
            },
            structure: CategoryFeedback {
                score: 90,
                tips: vec![],
            },
            skills: CategoryFeedback {
                score: 70,
                tips: vec![Tip {
                    kind: TipKind::Improve,
                    tip: "No Kubernetes experience listed".to_string(),
                    explanation: "The job description asks for container orchestration".to_string(),
                }],
            },
        }
    }

    fn sample_resume(feedback: FeedbackState) -> Resume {
        Resume {
            id: "abc123".to_string(),
            resume_path: "uploads/1/resume.pdf".to_string(),
            image_path: "uploads/2/resume.png".to_string(),
            company_name: "Initech".to_string(),
            job_title: "Backend Engineer".to_string(),
            job_description: "Go services".to_string(),
            feedback,
        }
    }

    #[test]
    fn test_round_trip_with_finalized_feedback() {
        let resume = sample_resume(FeedbackState::Ready(sample_feedback()));
        let encoded = serde_json::to_string(&resume).unwrap();
        let decoded: Resume = serde_json::from_str(&encoded).unwrap();
        assert_eq!(decoded, resume);
    }

    #[test]
    fn test_round_trip_with_pending_feedback() {
        let resume = sample_resume(FeedbackState::Pending);
        let encoded = serde_json::to_string(&resume).unwrap();
        let decoded: Resume = serde_json::from_str(&encoded).unwrap();
        assert_eq!(decoded, resume);
    }

    #[test]
    fn test_pending_feedback_serializes_as_empty_string() {
        let encoded = serde_json::to_value(sample_resume(FeedbackState::Pending)).unwrap();
        assert_eq!(encoded["feedback"], "");
    }

    #[test]
    fn test_record_layout_is_camel_case() {
        let encoded = serde_json::to_value(sample_resume(FeedbackState::Ready(sample_feedback())))
            .unwrap();
        assert!(encoded.get("resumePath").is_some());
        assert!(encoded.get("companyName").is_some());
        assert_eq!(encoded["feedback"]["overallScore"], 82);
        assert!(encoded["feedback"]["toneAndStyle"].get("score").is_some());
        assert_eq!(encoded["feedback"]["skills"]["tips"][0]["type"], "improve");
    }

    #[test]
    fn test_storage_key_derives_from_id_only() {
        let resume = sample_resume(FeedbackState::Pending);
        assert_eq!(resume.storage_key(), "resume:abc123");
        assert_eq!(resume_key("abc123"), "resume:abc123");
    }
}
