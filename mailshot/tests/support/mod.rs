#![allow(dead_code)]

use std::collections::VecDeque;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use mailshot::campaign::{CampaignService, Contact};
use mailshot::config::CampaignConfig;
use mailshot::jobs::MemoryJobStore;
use mailshot::mail::{Email, MailError, Mailer, SendReceipt};

/// Mailer that plays back queued outcomes, then succeeds, and records every
/// message handed to it.
#[derive(Default)]
pub struct ScriptedMailer {
    script: Mutex<VecDeque<Result<SendReceipt, MailError>>>,
    sent: Mutex<Vec<Email>>,
    reachable: AtomicBool,
    latency: Duration,
}

impl ScriptedMailer {
    pub fn new() -> Arc<Self> {
        Arc::new(Self {
            reachable: AtomicBool::new(true),
            ..Self::default()
        })
    }

    /// Every send takes `latency` before it answers.
    pub fn slow(latency: Duration) -> Arc<Self> {
        Arc::new(Self {
            reachable: AtomicBool::new(true),
            latency,
            ..Self::default()
        })
    }

    pub fn unreachable() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn then_fail(&self, err: MailError) -> &Self {
        self.script.lock().unwrap().push_back(Err(err));
        self
    }

    pub fn then_succeed(&self) -> &Self {
        self.script.lock().unwrap().push_back(Ok(receipt()));
        self
    }

    pub fn sent(&self) -> Vec<Email> {
        self.sent.lock().unwrap().clone()
    }

    pub fn recipients(&self) -> Vec<String> {
        self.sent().into_iter().map(|e| e.to).collect()
    }
}

fn receipt() -> SendReceipt {
    SendReceipt {
        message_id: Some(format!("<{}@example.com>", uuid::Uuid::new_v4())),
    }
}

#[async_trait]
impl Mailer for ScriptedMailer {
    async fn send(&self, email: &Email) -> Result<SendReceipt, MailError> {
        self.sent.lock().unwrap().push(email.clone());
        if !self.latency.is_zero() {
            tokio::time::sleep(self.latency).await;
        }
        self.script
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| Ok(receipt()))
    }

    async fn verify(&self) -> Result<bool, MailError> {
        if self.reachable.load(Ordering::SeqCst) {
            Ok(true)
        } else {
            Err(MailError::Timeout("connect to smtp relay".into()))
        }
    }
}

pub type TestService = CampaignService<Arc<ScriptedMailer>, MemoryJobStore>;

/// Config with no inter-send delays unless a test asks for them.
pub fn quiet_config() -> CampaignConfig {
    CampaignConfig {
        default_from_name: "Acme".into(),
        default_from_email: "news@acme.test".into(),
        delay_between_emails: 0,
        delay_between_batches: 0,
        pause_poll_interval: 10,
        ..CampaignConfig::default()
    }
}

pub fn service(mailer: &Arc<ScriptedMailer>) -> TestService {
    service_with(mailer, quiet_config())
}

pub fn service_with(mailer: &Arc<ScriptedMailer>, config: CampaignConfig) -> TestService {
    CampaignService::new(Arc::clone(mailer), MemoryJobStore::new(), config)
}

pub fn contacts(n: usize) -> Vec<Contact> {
    (1..=n)
        .map(|i| Contact::named(format!("user{i}@example.com"), format!("User{i}"), "Test"))
        .collect()
}
