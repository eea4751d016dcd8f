use crate::{Answers, Question};

/// Collects answers for a batch of questions, asked in order.
#[async_trait::async_trait]
pub trait Renderer: Send + Sync {
    async fn render(&self, questions: &[Question]) -> anyhow::Result<Answers>;
}
