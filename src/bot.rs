//! Chat front end state: what each chat is browsing, and the replies the bot
//! sends. Nothing here depends on the Telegram transport.

use std::collections::HashMap;

use tokio::sync::Mutex;

use crate::browse::{filter_page, Pager};
use crate::client::{ApiClient, ListQuery, RadiusQuery};
use crate::config::DEFAULT_RADIUS_KM;
use crate::error::ClientError;
use crate::fetch::RequestGate;
use crate::image::ImageUpload;
use crate::view;

pub type ChatKey = i64;

/// Inline button: a label and the callback data it sends back.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Button {
    pub label: String,
    pub data: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Reply {
    pub text: String,
    /// one row of buttons under the message
    pub buttons: Vec<Button>,
}

impl Reply {
    pub fn text(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            buttons: Vec::new(),
        }
    }
}

/// Callback data carried by inline buttons, "{category}-{payload}".
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Callback {
    Page(u32),
    Details { id: String, more: bool },
}

impl Callback {
    pub fn encode(&self) -> String {
        match self {
            Self::Page(page) => format!("PAGE-{page}"),
            Self::Details { id, more } => {
                format!("RSTBTN-{}-{id}", if *more { "more" } else { "less" })
            }
        }
    }

    pub fn parse(data: &str) -> Option<Self> {
        let (category, payload) = data.split_once('-')?;
        match category {
            "PAGE" => payload.parse().ok().map(Self::Page),
            "RSTBTN" => {
                let (action, id) = payload.split_once('-')?;
                let more = match action {
                    "more" => true,
                    "less" => false,
                    _ => return None,
                };
                (!id.is_empty()).then(|| Self::Details {
                    id: id.to_string(),
                    more,
                })
            }
            _ => None,
        }
    }

    fn button(self, label: &str) -> Button {
        Button {
            label: label.to_string(),
            data: self.encode(),
        }
    }
}

/// Arguments of `/near`: `<lat> <lng> [radius]`.
pub fn parse_near(args: &str) -> Result<RadiusQuery, &'static str> {
    let args: Vec<&str> = args.split_whitespace().collect();
    if args.len() < 2 {
        return Err("too less argument");
    }
    if args.len() > 3 {
        return Err("too many argument");
    }

    let Ok(lat) = args[0].parse::<f64>() else {
        return Err("Can not parse latitude into number");
    };
    let Ok(lng) = args[1].parse::<f64>() else {
        return Err("Can not parse longitude into number");
    };
    let radius = match args.get(2) {
        Some(radius) => radius
            .parse::<f64>()
            .map_err(|_| "Can not parse radius into number")?,
        None => DEFAULT_RADIUS_KM,
    };

    RadiusQuery::new(lat, lng, radius).map_err(|_| "Coordinates out of range")
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
struct BrowseSession {
    search: String,
    pager: Pager,
}

/// Shared state of the bot, one instance per process.
pub struct App {
    client: ApiClient,
    gate: RequestGate<ChatKey>,
    sessions: Mutex<HashMap<ChatKey, BrowseSession>>,
}

impl App {
    pub fn new(client: ApiClient) -> Self {
        Self {
            client,
            gate: RequestGate::new(),
            sessions: Mutex::new(HashMap::new()),
        }
    }

    /// Start browsing from the first page, narrowed by `search` if not blank.
    pub async fn search(&self, chat: ChatKey, search: &str) -> Option<Reply> {
        self.browse(chat, search.trim().to_string(), 1).await
    }

    pub async fn turn_page(&self, chat: ChatKey, page: u32) -> Option<Reply> {
        let session = self.sessions.lock().await.get(&chat).cloned();
        let (search, page) = match session {
            // stay within the page count of the last response
            Some(session) => (
                session.search,
                Pager::new(page, session.pager.total()).page(),
            ),
            None => (String::new(), page),
        };
        self.browse(chat, search, page).await
    }

    async fn browse(&self, chat: ChatKey, search: String, page: u32) -> Option<Reply> {
        let client = self.client.clone();
        let query = ListQuery {
            page: page.max(1),
            limit: None,
            search: search.clone(),
        };
        let outcome = self
            .gate
            .run(chat, async move { client.list(&query).await })
            .await?;

        let page_data = match outcome {
            Ok(page_data) => page_data,
            Err(e) => {
                tracing::error!("Error fetching data: {e}");
                return Some(Reply::text(view::FETCH_FAILED));
            }
        };

        let pager = Pager::new(page, page_data.total_pages());
        self.sessions.lock().await.insert(
            chat,
            BrowseSession {
                search: search.clone(),
                pager,
            },
        );

        let shown = filter_page(&page_data.restaurants, &search);
        let controls = pager.controls();
        let mut buttons = Vec::new();
        if let Some(previous) = controls.previous {
            buttons.push(Callback::Page(previous).button("« Previous"));
        }
        if let Some(next) = controls.next {
            buttons.push(Callback::Page(next).button("Next »"));
        }

        Some(Reply {
            text: view::listing(&shown, pager),
            buttons,
        })
    }

    pub async fn nearby(&self, chat: ChatKey, query: RadiusQuery) -> Option<Reply> {
        let client = self.client.clone();
        let outcome = self
            .gate
            .run(chat, async move { client.nearby(&query).await })
            .await?;

        Some(match outcome {
            Ok(restaurants) => Reply::text(view::nearby(&restaurants, query.radius())),
            Err(e) => {
                tracing::error!("Error fetching data: {e}");
                Reply::text(view::FETCH_FAILED)
            }
        })
    }

    pub async fn details(&self, chat: ChatKey, id: &str, show_more: bool) -> Option<Reply> {
        let client = self.client.clone();
        let request_id = id.to_string();
        let outcome = self
            .gate
            .run(chat, async move { client.restaurant(&request_id).await })
            .await?;

        Some(match outcome {
            Ok(restaurant) => {
                let (label, toggle) = if show_more {
                    ("Show Less", false)
                } else {
                    ("Show More", true)
                };
                let callback = Callback::Details {
                    id: id.to_string(),
                    more: toggle,
                };
                Reply {
                    text: view::details(&restaurant, show_more),
                    buttons: vec![callback.button(label)],
                }
            }
            Err(e) => {
                tracing::error!("fail to fetch restaurant {id}: {e}");
                Reply::text("Error: Failed to fetch restaurant details")
            }
        })
    }

    /// An image sent to the chat. `download` is the outcome of fetching its
    /// bytes from the chat service.
    pub async fn received_image(
        &self,
        chat: ChatKey,
        file_name: impl Into<String>,
        mime: impl Into<String>,
        download: anyhow::Result<Vec<u8>>,
    ) -> Option<Reply> {
        let bytes = match download {
            Ok(bytes) => bytes,
            Err(e) => {
                tracing::error!("fail to download image: {e:#}");
                return Some(Reply::text(view::FETCH_FAILED));
            }
        };

        match ImageUpload::new(file_name, mime, bytes) {
            Ok(upload) => self.image_search(chat, Some(upload)).await,
            Err(e) => {
                tracing::warn!("{e}");
                Some(Reply::text(view::INVALID_IMAGE))
            }
        }
    }

    pub async fn image_search(&self, chat: ChatKey, upload: Option<ImageUpload>) -> Option<Reply> {
        let Some(upload) = upload else {
            return Some(Reply::text(view::MISSING_IMAGE));
        };

        let client = self.client.clone();
        let outcome = self
            .gate
            .run(chat, async move { client.image_search(upload).await })
            .await?;

        Some(match outcome {
            Ok(restaurants) => Reply::text(view::image_matches(&restaurants)),
            Err(ClientError::InvalidImage { .. }) => Reply::text(view::INVALID_IMAGE),
            Err(e) => {
                tracing::error!("Error fetching restaurants: {e}");
                Reply::text(view::FETCH_FAILED)
            }
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ClientConfigBuilder;
    use std::sync::Arc;
    use tokio::io::{AsyncReadExt, AsyncWriteExt};
    use tokio::net::TcpListener;

    const PIZZA_PAGE: &str = r#"{
        "restaurants": [
            { "restaurant": { "id": "1", "name": "Pizza Hut", "cuisines": "Pizza, Fast Food",
              "location": { "city": "New Delhi" }, "average_cost_for_two": 800,
              "user_rating": { "aggregate_rating": "3.9", "votes": "412" } } },
            { "restaurant": { "id": "2", "name": "Bukhara", "cuisines": "North Indian",
              "location": { "city": "New Delhi" }, "average_cost_for_two": 6500,
              "user_rating": { "aggregate_rating": "4.6", "votes": "2891" } } }
        ],
        "totalPages": 3
    }"#;

    fn app_at(api_url: &str) -> Arc<App> {
        let config = ClientConfigBuilder::default()
            .api_url(api_url)
            .timeout(std::time::Duration::from_secs(2))
            .build()
            .unwrap();
        Arc::new(App::new(ApiClient::new(&config).unwrap()))
    }

    fn offline_app() -> Arc<App> {
        // nothing listens on the discard port
        app_at("http://127.0.0.1:9")
    }

    /// Serves `body` as JSON to every request and records the request lines.
    async fn serve_json(body: &'static str) -> (String, Arc<std::sync::Mutex<Vec<String>>>) {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let requests = Arc::new(std::sync::Mutex::new(Vec::new()));

        let seen = requests.clone();
        tokio::spawn(async move {
            while let Ok((mut socket, _)) = listener.accept().await {
                let mut head = Vec::new();
                let mut buf = [0u8; 1024];
                while !head.windows(4).any(|w| w == b"\r\n\r\n") {
                    match socket.read(&mut buf).await {
                        Ok(0) | Err(_) => break,
                        Ok(n) => head.extend_from_slice(&buf[..n]),
                    }
                }
                let head = String::from_utf8_lossy(&head);
                let line = head.lines().next().unwrap_or_default().to_string();
                seen.lock().unwrap().push(line);

                let response = format!(
                    "HTTP/1.1 200 OK\r\nContent-Type: application/json\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{body}",
                    body.len()
                );
                let _ = socket.write_all(response.as_bytes()).await;
                let _ = socket.shutdown().await;
            }
        });

        (format!("http://{addr}"), requests)
    }

    fn button(label: &str, data: &str) -> Button {
        Button {
            label: label.to_string(),
            data: data.to_string(),
        }
    }

    #[test]
    fn callback_data() {
        for callback in [
            Callback::Page(7),
            Callback::Details {
                id: "18237".to_string(),
                more: true,
            },
            Callback::Details {
                id: "a-b".to_string(),
                more: false,
            },
        ] {
            assert_eq!(Callback::parse(&callback.encode()), Some(callback));
        }
        assert_eq!(Callback::parse("PAGE-x"), None);
        assert_eq!(Callback::parse("RSTBTN-delete-1"), None);
        assert_eq!(Callback::parse("RSTBTN-more-"), None);
        assert_eq!(Callback::parse("nonsense"), None);
    }

    #[test]
    fn near_arguments() {
        let query = parse_near("28.61 77.20").unwrap();
        assert_eq!((query.lat(), query.lng(), query.radius()), (28.61, 77.20, 100.0));
        assert_eq!(parse_near("28.61 77.20 5").unwrap().radius(), 5.0);
        assert!(parse_near("28.61").is_err());
        assert!(parse_near("north 77.20").is_err());
        assert!(parse_near("28.61 77.20 far").is_err());
        assert!(parse_near("128.61 77.20").is_err());
        assert!(parse_near("1 2 3 4").is_err());
    }

    #[tokio::test]
    async fn missing_image_needs_no_request() {
        let app = offline_app();
        let reply = app.image_search(1, None).await.unwrap();
        assert_eq!(reply.text, view::MISSING_IMAGE);
        assert!(!app.gate.is_loading(&1).await);
    }

    #[tokio::test]
    async fn failed_download_shows_generic_error() {
        let app = offline_app();
        let reply = app
            .received_image(1, "photo.jpg", "image/jpeg", Err(anyhow::anyhow!("timed out")))
            .await
            .unwrap();
        assert_eq!(reply, Reply::text(view::FETCH_FAILED));

        let reply = app
            .received_image(1, "notes.txt", "text/plain", Ok(vec![1, 2, 3]))
            .await
            .unwrap();
        assert_eq!(reply, Reply::text(view::INVALID_IMAGE));
    }

    #[tokio::test]
    async fn search_filters_page_and_keeps_keyword_when_paging() {
        let (url, requests) = serve_json(PIZZA_PAGE).await;
        let app = app_at(&url);

        let first = app.search(1, "pizza").await.unwrap();
        assert!(first.text.contains("Pizza Hut"), "{}", first.text);
        assert!(!first.text.contains("Bukhara"), "{}", first.text);
        assert!(first.text.ends_with("Page 1 of 3"), "{}", first.text);
        assert_eq!(first.buttons, [button("Next »", "PAGE-2")]);

        let middle = app.turn_page(1, 2).await.unwrap();
        assert!(middle.text.ends_with("Page 2 of 3"), "{}", middle.text);
        assert_eq!(
            middle.buttons,
            [button("« Previous", "PAGE-1"), button("Next »", "PAGE-3")]
        );

        let last = app.turn_page(1, 3).await.unwrap();
        assert!(last.text.ends_with("Page 3 of 3"), "{}", last.text);
        assert_eq!(last.buttons, [button("« Previous", "PAGE-2")]);

        let requests = requests.lock().unwrap().clone();
        assert_eq!(requests.len(), 3);
        assert!(requests[0].starts_with("GET /api/restaurants?page=1&"), "{}", requests[0]);
        assert!(requests[2].starts_with("GET /api/restaurants?page=3&"), "{}", requests[2]);
        for line in &requests {
            assert!(line.contains("&search=pizza "), "{line}");
        }
    }

    #[tokio::test]
    async fn page_past_the_end_is_clamped_before_fetching() {
        let (url, requests) = serve_json(PIZZA_PAGE).await;
        let app = app_at(&url);

        app.search(1, "").await.unwrap();
        let reply = app.turn_page(1, 9).await.unwrap();
        assert!(reply.text.ends_with("Page 3 of 3"), "{}", reply.text);

        let requests = requests.lock().unwrap().clone();
        assert!(requests[1].contains("?page=3&"), "{}", requests[1]);
        assert!(!requests.iter().any(|line| line.contains("page=9")));
    }

    #[tokio::test]
    async fn unreachable_api_shows_generic_error() {
        let app = offline_app();
        let reply = app.search(1, "pizza").await.unwrap();
        assert_eq!(reply, Reply::text(view::FETCH_FAILED));

        let reply = app.details(1, "42", false).await.unwrap();
        assert_eq!(reply.text, "Error: Failed to fetch restaurant details");
    }
}
