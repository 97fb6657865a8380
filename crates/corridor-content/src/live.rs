use std::time::Duration;

use rayon::{ThreadPool, ThreadPoolBuilder};
use serde::{Deserialize, Serialize};

use crate::client::{
    ContentError, ContentItem, ContentRequest, GenerativeContentClient, ImageHandle, ImageSource,
};
use crate::handle::pending;
use crate::prompt::{PromptTemplate, clean_phrase};

#[derive(Clone, Debug)]
pub struct LiveOptions {
    pub base_url: String,
    pub text_model: String,
    pub image_size: String,
    pub max_tokens: u32,
    pub timeout: Duration,
    /// Image generations running at once; further requests queue behind them.
    pub image_workers: usize,
}

impl Default for LiveOptions {
    fn default() -> Self {
        Self {
            base_url: "https://api.openai.com".to_string(),
            text_model: "gpt-3.5-turbo-instruct".to_string(),
            image_size: "512x512".to_string(),
            max_tokens: 100,
            timeout: Duration::from_secs(60),
            image_workers: 4,
        }
    }
}

/// Hosted completion + image generation client (blocking; runs on worker threads).
pub struct OpenAiClient {
    http: reqwest::blocking::Client,
    api_key: String,
    options: LiveOptions,
    prompts: PromptTemplate,
    images: ThreadPool,
}

#[derive(Serialize)]
struct CompletionRequest<'a> {
    model: &'a str,
    prompt: &'a str,
    max_tokens: u32,
    n: usize,
    stop: [&'a str; 1],
}

#[derive(Deserialize)]
struct CompletionResponse {
    #[serde(default)]
    choices: Vec<CompletionChoice>,
}

#[derive(Deserialize)]
struct CompletionChoice {
    #[serde(default)]
    text: Option<String>,
}

#[derive(Serialize)]
struct ImageRequest<'a> {
    prompt: &'a str,
    size: &'a str,
    n: u32,
    response_format: &'a str,
}

#[derive(Deserialize)]
struct ImagesResponse {
    #[serde(default)]
    data: Vec<ImageDatum>,
}

#[derive(Deserialize)]
struct ImageDatum {
    #[serde(default)]
    b64_json: Option<String>,
    #[serde(default)]
    url: Option<String>,
}

impl OpenAiClient {
    pub fn new(
        api_key: impl Into<String>,
        prompts: PromptTemplate,
        options: LiveOptions,
    ) -> Result<Self, ContentError> {
        let http = reqwest::blocking::Client::builder()
            .timeout(options.timeout)
            .build()
            .map_err(|e| ContentError::Transport(e.to_string()))?;
        let images = ThreadPoolBuilder::new()
            .num_threads(options.image_workers.max(1))
            .thread_name(|i| format!("corridor-live-images-{i}"))
            .build()
            .map_err(|e| ContentError::Transport(format!("image pool: {e}")))?;
        Ok(Self {
            http,
            api_key: api_key.into(),
            options,
            prompts,
            images,
        })
    }

    fn post<B: Serialize, R: for<'de> Deserialize<'de>>(
        http: &reqwest::blocking::Client,
        url: &str,
        api_key: &str,
        body: &B,
    ) -> Result<R, ContentError> {
        let resp = http
            .post(url)
            .bearer_auth(api_key)
            .json(body)
            .send()
            .map_err(|e| ContentError::Transport(e.to_string()))?;
        let status = resp.status();
        if !status.is_success() {
            let message = resp.text().unwrap_or_default();
            return Err(ContentError::Api {
                status: status.as_u16(),
                message,
            });
        }
        resp.json::<R>()
            .map_err(|e| ContentError::Malformed(e.to_string()))
    }

    fn spawn_image(&self, phrase: &str) -> ImageHandle {
        let (resolver, handle) = pending();
        let http = self.http.clone();
        let api_key = self.api_key.clone();
        let url = format!("{}/v1/images/generations", self.options.base_url);
        let size = self.options.image_size.clone();
        let prompt = self.prompts.image_prompt(phrase);
        self.images.spawn(move || {
            let body = ImageRequest {
                prompt: &prompt,
                size: &size,
                n: 1,
                response_format: "b64_json",
            };
            let result = Self::post::<_, ImagesResponse>(&http, &url, &api_key, &body).and_then(
                |resp| match resp.data.into_iter().next() {
                    Some(ImageDatum {
                        b64_json: Some(b64),
                        ..
                    }) => Ok(ImageSource::Base64(b64)),
                    Some(ImageDatum { url: Some(url), .. }) => Ok(ImageSource::Url(url)),
                    _ => Err(ContentError::Malformed("image response without data".into())),
                },
            );
            if let Err(e) = &result {
                log::warn!("image generation failed for {:?}: {}", prompt, e);
            }
            let _ = resolver.resolve(result);
        });
        handle
    }
}

impl GenerativeContentClient for OpenAiClient {
    fn name(&self) -> &str {
        "live"
    }

    fn request_content(&self, req: &ContentRequest<'_>) -> Result<Vec<ContentItem>, ContentError> {
        let url = format!("{}/v1/completions", self.options.base_url);
        let body = CompletionRequest {
            model: &self.options.text_model,
            prompt: req.prompt,
            max_tokens: self.options.max_tokens,
            n: req.count,
            stop: ["\"\"\""],
        };
        let resp: CompletionResponse = Self::post(&self.http, &url, &self.api_key, &body)?;
        log::debug!(
            "completion returned {} choice(s) for {:?}",
            resp.choices.len(),
            req.topic
        );
        Ok(resp
            .choices
            .into_iter()
            .map(|c| clean_phrase(c.text.as_deref().unwrap_or_default()))
            .take(req.count)
            .map(|phrase| {
                let image = self.spawn_image(&phrase);
                ContentItem::new(phrase, image)
            })
            .collect())
    }
}
