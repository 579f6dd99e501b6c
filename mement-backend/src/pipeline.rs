//! Question-answering pipeline: generate an answer for a tenant, fan it out
//! to the tenant's channels and persist the exchange. Exactly one chat row is
//! written per successful answer; channel failures never lose the answer.

use chrono::Utc;
use std::fmt;
use std::sync::Arc;

use crate::ai::GenerationWorkflow;
use crate::channels::{ChannelOutcome, DistributionAttempt, SocialPoster, TelegramGateway};
use crate::db::Database;
use crate::ids;
use crate::models::{Agent, Chat};

/// Hard limit shared by all channels.
pub const ANSWER_CHAR_LIMIT: usize = 280;

#[derive(Debug)]
pub enum AskError {
    AgentNotFound,
    Rejected { details: String },
    Generation(String),
    Storage(String),
}

impl fmt::Display for AskError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AskError::AgentNotFound => write!(f, "agent not found"),
            AskError::Rejected { details } => write!(f, "question rejected: {}", details),
            AskError::Generation(details) => write!(f, "generation failed: {}", details),
            AskError::Storage(details) => write!(f, "storage failed: {}", details),
        }
    }
}

fn normalize(answer: &str) -> String {
    answer.replace(['\n', '\r'], " ").trim().to_string()
}

fn truncate_chars(text: &str, limit: usize) -> String {
    text.chars().take(limit).collect()
}

pub struct AskPipeline {
    db: Arc<Database>,
    workflow: Arc<dyn GenerationWorkflow>,
    telegram: Arc<dyn TelegramGateway>,
    twitter: Arc<dyn SocialPoster>,
}

impl AskPipeline {
    pub fn new(
        db: Arc<Database>,
        workflow: Arc<dyn GenerationWorkflow>,
        telegram: Arc<dyn TelegramGateway>,
        twitter: Arc<dyn SocialPoster>,
    ) -> Self {
        Self {
            db,
            workflow,
            telegram,
            twitter,
        }
    }

    /// Stored context whose question pattern matches the asked question.
    /// Lookup failures degrade to an empty context.
    fn context_for(&self, subdomain: &str, question: &str) -> String {
        match self.db.find_context(subdomain, question) {
            Ok(context) => context.unwrap_or_default(),
            Err(e) => {
                log::warn!("[ASK] context lookup failed for '{}': {}", subdomain, e);
                String::new()
            }
        }
    }

    async fn fit_to_limit(&self, answer: String) -> Result<String, AskError> {
        if answer.chars().count() <= ANSWER_CHAR_LIMIT {
            return Ok(answer);
        }

        let shortened = self
            .workflow
            .shorten(&answer, ANSWER_CHAR_LIMIT)
            .await
            .map_err(AskError::Generation)?;
        let shortened = normalize(&shortened);
        let replacement = if shortened.is_empty() { answer } else { shortened };

        // The workflow is asked for the limit but not trusted to honor it.
        Ok(truncate_chars(&replacement, ANSWER_CHAR_LIMIT))
    }

    /// Telegram is notified best-effort; Twitter is the primary channel and
    /// yields the public post link. Neither can fail the request.
    async fn distribute(&self, agent: &Agent, text: &str) -> Vec<DistributionAttempt> {
        let mut attempts = Vec::new();

        let telegram = match self.db.get_telegram_bot(&agent.subdomain) {
            Ok(Some(bot)) => match self.telegram.send_group_message(&bot, text).await {
                Ok(()) => ChannelOutcome::Delivered { post_link: None },
                Err(e) => ChannelOutcome::Failed(e),
            },
            Ok(None) => ChannelOutcome::Skipped("no telegram bot"),
            Err(e) => ChannelOutcome::Failed(e.to_string()),
        };
        attempts.push(DistributionAttempt {
            channel: "telegram",
            outcome: telegram,
        });

        let twitter = match self.db.get_twitter_bot(&agent.subdomain) {
            Ok(Some(bot)) => match self.twitter.post(&bot, text).await {
                Ok(link) => ChannelOutcome::Delivered {
                    post_link: Some(link),
                },
                Err(e) => ChannelOutcome::Failed(e),
            },
            Ok(None) => ChannelOutcome::Skipped("no twitter bot"),
            Err(e) => ChannelOutcome::Failed(e.to_string()),
        };
        attempts.push(DistributionAttempt {
            channel: "twitter",
            outcome: twitter,
        });

        for attempt in &attempts {
            match &attempt.outcome {
                ChannelOutcome::Failed(e) => {
                    log::error!("[ASK] {} delivery failed: {}", attempt.channel, e)
                }
                ChannelOutcome::Skipped(reason) => {
                    log::debug!("[ASK] {} skipped: {}", attempt.channel, reason)
                }
                ChannelOutcome::Delivered { .. } => {
                    log::info!("[ASK] {} delivered", attempt.channel)
                }
            }
        }

        attempts
    }

    pub async fn ask(&self, subdomain: &str, question: &str) -> Result<Chat, AskError> {
        let agent = self
            .db
            .get_agent(subdomain)
            .map_err(|e| AskError::Storage(e.to_string()))?
            .ok_or(AskError::AgentNotFound)?;

        let context = self.context_for(subdomain, question);
        let result = self
            .workflow
            .answer(&agent.workflow, &agent.prompt, question, &context)
            .await
            .map_err(AskError::Generation)?;

        if !result.answerable {
            return Err(AskError::Rejected {
                details: result.rationale,
            });
        }

        let answer = self.fit_to_limit(normalize(&result.answer)).await?;
        let attempts = self.distribute(&agent, &answer).await;
        let twitter_post_link = attempts
            .iter()
            .find_map(|a| a.post_link())
            .map(|link| link.to_string());

        let chat = Chat {
            id: ids::short_id(ids::CHAT_ID_LEN),
            subdomain: subdomain.to_string(),
            question: question.to_string(),
            response: answer,
            timestamp: Utc::now(),
            twitter_post_link,
        };
        self.db
            .insert_chat(&chat)
            .map_err(|e| AskError::Storage(e.to_string()))?;

        Ok(chat)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ai::{AgentFields, WorkflowAnswer};
    use crate::db::ProvisionRecord;
    use crate::models::{TelegramBot, TwitterBot};
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct FakeWorkflow {
        answerable: bool,
        answer: String,
        shortened: String,
    }

    #[async_trait]
    impl GenerationWorkflow for FakeWorkflow {
        async fn answer(
            &self,
            _workflow: &str,
            _task: &str,
            _question: &str,
            _context: &str,
        ) -> Result<WorkflowAnswer, String> {
            Ok(WorkflowAnswer {
                answerable: self.answerable,
                answer: self.answer.clone(),
                rationale: "verdict".to_string(),
            })
        }

        async fn shorten(&self, _text: &str, _limit: usize) -> Result<String, String> {
            Ok(self.shortened.clone())
        }

        async fn agent_fields(&self, _idea: &str) -> Result<AgentFields, String> {
            Err("not used".to_string())
        }
    }

    struct FakeTelegram {
        sends: AtomicUsize,
        fail: bool,
    }

    #[async_trait]
    impl TelegramGateway for FakeTelegram {
        async fn first_chat_id(&self, _bot_token: &str) -> Result<Option<String>, String> {
            Ok(None)
        }

        async fn send_group_message(&self, _bot: &TelegramBot, _text: &str) -> Result<(), String> {
            self.sends.fetch_add(1, Ordering::SeqCst);
            if self.fail {
                Err("telegram down".to_string())
            } else {
                Ok(())
            }
        }
    }

    struct FakeTwitter {
        fail: bool,
    }

    #[async_trait]
    impl SocialPoster for FakeTwitter {
        async fn post(&self, bot: &TwitterBot, _text: &str) -> Result<String, String> {
            if self.fail {
                Err("twitter down".to_string())
            } else {
                Ok(format!("https://twitter.com/{}/status/1", bot.screen_name))
            }
        }
    }

    fn seeded_db() -> Arc<Database> {
        let db = Arc::new(Database::open_in_memory().unwrap());
        db.provision_tenant(&ProvisionRecord {
            agent: Agent {
                subdomain: "gardener".to_string(),
                name: "Gardener".to_string(),
                titles: String::new(),
                suggestions: String::new(),
                prompt: "You garden.".to_string(),
                workflow: String::new(),
                image_cid: None,
            },
            domains: vec![],
            links: vec![],
            twitter_bot: Some(TwitterBot {
                subdomain: "gardener".to_string(),
                oauth_token: "t".to_string(),
                oauth_token_secret: "ts".to_string(),
                user_id: "1".to_string(),
                screen_name: "gardener_bot".to_string(),
            }),
            telegram_bot: Some(TelegramBot {
                subdomain: "gardener".to_string(),
                bot_token: "bt".to_string(),
                group_id: "555".to_string(),
            }),
        })
        .unwrap();
        db
    }

    fn pipeline(
        db: Arc<Database>,
        workflow: FakeWorkflow,
        telegram_fail: bool,
        twitter_fail: bool,
    ) -> (AskPipeline, Arc<FakeTelegram>) {
        let telegram = Arc::new(FakeTelegram {
            sends: AtomicUsize::new(0),
            fail: telegram_fail,
        });
        let pipeline = AskPipeline::new(
            db,
            Arc::new(workflow),
            telegram.clone(),
            Arc::new(FakeTwitter { fail: twitter_fail }),
        );
        (pipeline, telegram)
    }

    fn answering(answer: &str) -> FakeWorkflow {
        FakeWorkflow {
            answerable: true,
            answer: answer.to_string(),
            shortened: answer.to_string(),
        }
    }

    #[tokio::test]
    async fn test_rejected_question_writes_nothing() {
        let db = seeded_db();
        let (pipeline, _) = pipeline(
            db.clone(),
            FakeWorkflow {
                answerable: false,
                answer: String::new(),
                shortened: String::new(),
            },
            false,
            false,
        );

        let result = pipeline.ask("gardener", "Who wins the election?").await;
        assert!(matches!(result, Err(AskError::Rejected { .. })));
        assert_eq!(db.count_chats("gardener").unwrap(), 0);
    }

    #[tokio::test]
    async fn test_successful_ask_writes_one_chat_with_link() {
        let db = seeded_db();
        let (pipeline, telegram) = pipeline(db.clone(), answering("Plant in spring."), false, false);

        let chat = pipeline.ask("gardener", "When to plant?").await.unwrap();
        assert_eq!(chat.response, "Plant in spring.");
        assert_eq!(
            chat.twitter_post_link.as_deref(),
            Some("https://twitter.com/gardener_bot/status/1")
        );
        assert_eq!(telegram.sends.load(Ordering::SeqCst), 1);
        assert_eq!(db.count_chats("gardener").unwrap(), 1);

        let stored = db.get_chat(&chat.id).unwrap().unwrap();
        assert_eq!(stored.response, chat.response);
    }

    #[tokio::test]
    async fn test_twitter_failure_persists_chat_without_link() {
        let db = seeded_db();
        let (pipeline, _) = pipeline(db.clone(), answering("Plant in spring."), false, true);

        let chat = pipeline.ask("gardener", "When to plant?").await.unwrap();
        assert!(chat.twitter_post_link.is_none());
        assert_eq!(db.count_chats("gardener").unwrap(), 1);
    }

    #[tokio::test]
    async fn test_telegram_failure_does_not_block_twitter() {
        let db = seeded_db();
        let (pipeline, telegram) = pipeline(db.clone(), answering("Plant in spring."), true, false);

        let chat = pipeline.ask("gardener", "When to plant?").await.unwrap();
        assert_eq!(telegram.sends.load(Ordering::SeqCst), 1);
        assert!(chat.twitter_post_link.is_some());
    }

    #[tokio::test]
    async fn test_long_answer_is_shortened_and_capped() {
        let db = seeded_db();
        let (pipeline, _) = pipeline(
            db.clone(),
            FakeWorkflow {
                answerable: true,
                answer: "a".repeat(400),
                shortened: "b".repeat(300),
            },
            false,
            false,
        );

        let chat = pipeline.ask("gardener", "Tell me everything.").await.unwrap();
        assert_eq!(chat.response.chars().count(), ANSWER_CHAR_LIMIT);
        assert!(chat.response.starts_with('b'));
    }

    #[tokio::test]
    async fn test_empty_shorten_result_falls_back_to_truncation() {
        let db = seeded_db();
        let (pipeline, _) = pipeline(
            db.clone(),
            FakeWorkflow {
                answerable: true,
                answer: "a".repeat(400),
                shortened: String::new(),
            },
            false,
            false,
        );

        let chat = pipeline.ask("gardener", "Tell me everything.").await.unwrap();
        assert_eq!(chat.response, "a".repeat(ANSWER_CHAR_LIMIT));
    }

    #[tokio::test]
    async fn test_unknown_agent() {
        let db = seeded_db();
        let (pipeline, _) = pipeline(db, answering("hi"), false, false);
        assert!(matches!(
            pipeline.ask("nobody", "Hello?").await,
            Err(AskError::AgentNotFound)
        ));
    }

    #[test]
    fn test_normalize_strips_newlines() {
        assert_eq!(normalize("  a\nb\r\nc  "), "a b  c");
    }
}
