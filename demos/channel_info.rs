//! Look up a channel and its creator with the web API client.
//!
//! Before running:
//! - Replace the token and channel placeholders.

use std::error::Error;

use banter_sdk::web_api::WebApiClient;
use secrecy::SecretString;

#[tokio::main]
async fn main() -> Result<(), Box<dyn Error>> {
    let token = "REPLACE_WITH_SESSION_TOKEN".to_string();
    let channel_id = "REPLACE_WITH_CHANNEL_ID".to_string();

    let client = WebApiClient::new(SecretString::new(token))?;

    let channel = client.channel_info(&channel_id).await?;
    println!("name=#{} members={}", channel.name, channel.members.len());
    if !channel.topic.value.is_empty() {
        println!("topic={}", channel.topic.value);
    }

    let creator = client.user_info(&channel.creator).await?;
    println!("created_by={} ({})", creator.name, creator.profile.real_name);

    Ok(())
}
