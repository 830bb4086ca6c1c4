use crate::commands::NotifyCommand;
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Body posted to the mail relay webhook.
#[derive(Serialize, Deserialize, Debug, PartialEq, Eq)]
pub struct OutboundNotice {
    pub kind: String,
    pub user_id: String,
    pub audience: String,
    pub subject: String,
    pub body: String,
    pub warnings: Option<i64>,
}

pub fn build_outbound_notice(cmd: &NotifyCommand) -> Value {
    let notice = match cmd {
        NotifyCommand::CommentRemoval { user_id } => OutboundNotice {
            kind: "comment_removal".to_string(),
            user_id: user_id.clone(),
            audience: "user".to_string(),
            subject: "One of your comments was moderated".to_string(),
            body: "A comment you posted contained language that breaks the community \
                   guidelines and has been blurred or hidden."
                .to_string(),
            warnings: None,
        },
        NotifyCommand::AccountReview { user_id, warnings } => OutboundNotice {
            kind: "account_review".to_string(),
            user_id: user_id.clone(),
            audience: "admins".to_string(),
            subject: format!("Account {} needs review", user_id),
            body: format!(
                "User {} has accumulated {} warnings. Consider deactivating the account.",
                user_id, warnings
            ),
            warnings: Some(*warnings),
        },
    };

    serde_json::json!({ "parley.v1": notice })
}
