use async_trait::async_trait;

/// Yes/no question put to the user before a destructive action.
#[async_trait]
pub trait ConfirmPrompt: Send + Sync {
    async fn confirm(&self, message: &str) -> bool;
}

/// Answers every prompt the same way (`--yes`, tests).
#[derive(Debug, Clone, Copy)]
pub struct StaticConfirm(pub bool);

#[async_trait]
impl ConfirmPrompt for StaticConfirm {
    async fn confirm(&self, message: &str) -> bool {
        tracing::debug!(target: "taskdeck.confirm", answer = self.0, message = %message);
        self.0
    }
}
