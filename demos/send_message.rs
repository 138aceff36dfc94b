//! Send a chat message over a real-time session and wait for its ack.
//!
//! Before running:
//! - Replace the token and channel placeholders.
//!
//! The ack echoes the request id in `reply_to` along with the timestamp the
//! server assigned to the message.

use std::error::Error;

use banter_sdk::rtm::client::RtmClient;
use banter_sdk::rtm::proto::{InboundFrame, OutboundMessage};
use secrecy::SecretString;

#[tokio::main]
async fn main() -> Result<(), Box<dyn Error>> {
    let token = "REPLACE_WITH_SESSION_TOKEN".to_string();
    let channel = "REPLACE_WITH_CHANNEL_ID".to_string();

    let client = RtmClient::new(SecretString::new(token))?;
    let session = client.connect().await?;

    let mut message = OutboundMessage::chat(channel, "hello from banter-sdk");
    let id = session.send(&mut message).await?;
    println!("sent id={id}");

    loop {
        match session.receive().await? {
            InboundFrame::Ack(ack) if ack.reply_to == id => {
                if ack.ok {
                    println!("acked reply_to={} ts={}", ack.reply_to, ack.ts);
                } else if let Some(error) = ack.error {
                    println!("rejected code={} msg={}", error.code, error.msg);
                }
                break;
            }
            InboundFrame::Ack(_) => {}
            InboundFrame::Event(event) => println!("event type={}", event.kind),
        }
    }

    session.close().await?;
    Ok(())
}
