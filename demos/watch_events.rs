use std::error::Error;

use banter_sdk::rtm::client::RtmClient;
use banter_sdk::rtm::proto::InboundFrame;
use secrecy::SecretString;

fn main() -> Result<(), Box<dyn Error>> {
    let token = "REPLACE_WITH_SESSION_TOKEN".to_string();

    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()?;

    runtime.block_on(async {
        let client = RtmClient::new(SecretString::new(token))?;
        let session = client.connect().await?;
        println!("connected, watching for events");

        loop {
            match session.receive().await {
                Ok(InboundFrame::Event(event)) => {
                    let channel = event.channel.as_deref().unwrap_or("-");
                    let user = event.user.as_deref().unwrap_or("-");
                    let text = event.text.as_deref().unwrap_or("");
                    println!(
                        "type={} channel={channel} user={user} text={text}",
                        event.kind
                    );
                }
                Ok(InboundFrame::Ack(ack)) => {
                    println!("ack reply_to={} ok={}", ack.reply_to, ack.ok);
                }
                Err(error) => {
                    println!("session ended: {error}");
                    break;
                }
            }
        }

        Ok::<(), Box<dyn Error>>(())
    })
}
