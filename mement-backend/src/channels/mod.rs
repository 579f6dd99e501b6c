//! Distribution channels an answer fans out to. The pipeline walks an
//! ordered list of attempts; each attempt catches its own failure so one
//! channel can never abort the request or another channel.

pub mod telegram;
pub mod twitter;

pub use telegram::{TelegramClient, TelegramGateway};
pub use twitter::{SocialPoster, TwitterClient};

/// Result of one distribution attempt.
#[derive(Debug, Clone)]
pub enum ChannelOutcome {
    /// The channel accepted the answer; a social post also yields a link.
    Delivered { post_link: Option<String> },
    /// No credentials configured for this agent.
    Skipped(&'static str),
    /// The call failed; logged, never surfaced.
    Failed(String),
}

#[derive(Debug, Clone)]
pub struct DistributionAttempt {
    pub channel: &'static str,
    pub outcome: ChannelOutcome,
}

impl DistributionAttempt {
    pub fn post_link(&self) -> Option<&str> {
        match &self.outcome {
            ChannelOutcome::Delivered { post_link } => post_link.as_deref(),
            _ => None,
        }
    }
}
