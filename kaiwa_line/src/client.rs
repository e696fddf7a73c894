use std::time::Duration;

use reqwest::Client;
use serde_json::json;
use tracing::info;

use crate::{Error, Result};

const API_BASE: &str = "https://api.line.me";
const BLOB_BASE: &str = "https://api-data.line.me";

/// Outbound LINE Messaging API client.
///
/// Per-turn traffic is reply sends only; the rich-menu calls run once at
/// setup time.
pub struct LineClient {
    client: Client,
    access_token: String,
    api_base: String,
    blob_base: String,
    timeout: Duration,
}

impl LineClient {
    #[must_use]
    pub fn new(access_token: String) -> Self {
        info!("Creating LineClient");
        Self {
            client: Client::new(),
            access_token,
            api_base: API_BASE.to_string(),
            blob_base: BLOB_BASE.to_string(),
            timeout: Duration::from_secs(30),
        }
    }

    #[must_use]
    pub fn with_api_base(mut self, api_base: String) -> Self {
        self.api_base = api_base;
        self
    }

    #[must_use]
    pub fn with_blob_base(mut self, blob_base: String) -> Self {
        self.blob_base = blob_base;
        self
    }

    #[must_use]
    pub const fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Send one text message against a reply token.
    pub async fn reply_text(&self, reply_token: &str, text: &str) -> Result<()> {
        let body = json!({
            "replyToken": reply_token,
            "messages": [{ "type": "text", "text": text }],
        });

        let response = self
            .client
            .post(format!("{}/v2/bot/message/reply", self.api_base))
            .bearer_auth(&self.access_token)
            .timeout(self.timeout)
            .json(&body)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            return Err(Error::Api(format!("reply failed with status {status}")));
        }

        Ok(())
    }

    /// Create the default rich menu and return its id.
    pub async fn create_rich_menu(&self, reset_keyword: &str, greeting: &str) -> Result<String> {
        let response = self
            .client
            .post(format!("{}/v2/bot/richmenu", self.api_base))
            .bearer_auth(&self.access_token)
            .timeout(self.timeout)
            .json(&rich_menu_request(reset_keyword, greeting))
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            return Err(Error::Api(format!(
                "rich menu creation failed with status {status}"
            )));
        }

        let body = response.json::<serde_json::Value>().await?;
        body["richMenuId"].as_str().map_or_else(
            || Err(Error::Api("rich menu response missing richMenuId".to_string())),
            |id| Ok(id.to_string()),
        )
    }

    /// Upload the JPEG image shown behind the rich menu.
    pub async fn upload_rich_menu_image(&self, rich_menu_id: &str, image: Vec<u8>) -> Result<()> {
        let response = self
            .client
            .post(format!(
                "{}/v2/bot/richmenu/{rich_menu_id}/content",
                self.blob_base
            ))
            .bearer_auth(&self.access_token)
            .timeout(self.timeout)
            .header("Content-Type", "image/jpeg")
            .body(image)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            return Err(Error::Api(format!(
                "rich menu image upload failed with status {status}"
            )));
        }

        Ok(())
    }

    /// Make the rich menu the default for all users.
    pub async fn set_default_rich_menu(&self, rich_menu_id: &str) -> Result<()> {
        let response = self
            .client
            .post(format!(
                "{}/v2/bot/user/all/richmenu/{rich_menu_id}",
                self.api_base
            ))
            .bearer_auth(&self.access_token)
            .timeout(self.timeout)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            return Err(Error::Api(format!(
                "setting default rich menu failed with status {status}"
            )));
        }

        Ok(())
    }

    /// Link the rich menu to a single user.
    pub async fn link_rich_menu_to_user(&self, user_id: &str, rich_menu_id: &str) -> Result<()> {
        let response = self
            .client
            .post(format!(
                "{}/v2/bot/user/{user_id}/richmenu/{rich_menu_id}",
                self.api_base
            ))
            .bearer_auth(&self.access_token)
            .timeout(self.timeout)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            return Err(Error::Api(format!(
                "linking rich menu failed with status {status}"
            )));
        }

        Ok(())
    }
}

/// Rich menu definition: two tap areas, left sends the reset keyword,
/// right sends a greeting.
fn rich_menu_request(reset_keyword: &str, greeting: &str) -> serde_json::Value {
    json!({
        "size": { "width": 2500, "height": 1686 },
        "selected": false,
        "name": "デフォルトメニュー",
        "chatBarText": "メニューを開く",
        "areas": [
            {
                "bounds": { "x": 0, "y": 0, "width": 1250, "height": 1686 },
                "action": { "type": "message", "label": reset_keyword, "text": reset_keyword }
            },
            {
                "bounds": { "x": 1250, "y": 0, "width": 1250, "height": 1686 },
                "action": { "type": "message", "label": greeting, "text": greeting }
            }
        ]
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rich_menu_request_covers_full_width_in_two_areas() {
        let menu = rich_menu_request("リセット", "こんにちは");

        assert_eq!(menu["size"]["width"], 2500);
        assert_eq!(menu["size"]["height"], 1686);

        let areas = menu["areas"].as_array().map(Vec::as_slice).unwrap_or(&[]);
        assert_eq!(areas.len(), 2);
        assert_eq!(areas[0]["bounds"]["x"], 0);
        assert_eq!(areas[0]["bounds"]["width"], 1250);
        assert_eq!(areas[1]["bounds"]["x"], 1250);
        assert_eq!(areas[0]["action"]["text"], "リセット");
        assert_eq!(areas[1]["action"]["text"], "こんにちは");
    }
}
