//! Shared test doubles

use std::sync::{Arc, Mutex};

use async_trait::async_trait;

use template_mailer::transport::{DeliveryReceipt, MailTransport, OutgoingEmail, TransportError};
use template_mailer::Mailer;

/// Transport that keeps every message instead of delivering it
#[derive(Default)]
pub struct RecordingTransport {
    sent: Mutex<Vec<OutgoingEmail>>,
}

impl RecordingTransport {
    pub fn sent(&self) -> Vec<OutgoingEmail> {
        self.sent.lock().unwrap().clone()
    }
}

#[async_trait]
impl MailTransport for RecordingTransport {
    fn name(&self) -> &'static str {
        "recording"
    }

    async fn send(&self, email: &OutgoingEmail) -> Result<DeliveryReceipt, TransportError> {
        let mut sent = self.sent.lock().unwrap();
        sent.push(email.clone());
        Ok(DeliveryReceipt::new(
            format!("<{}@recording.test>", sent.len()),
            vec![email.to.clone()],
        )
        .with_response("250 OK"))
    }
}

/// Mailer wired to a fresh recording transport
pub async fn recording_mailer() -> (Arc<Mailer>, Arc<RecordingTransport>) {
    let mailer = Arc::new(Mailer::new());
    let transport = Arc::new(RecordingTransport::default());
    mailer.set_transport(transport.clone()).await;
    (mailer, transport)
}
