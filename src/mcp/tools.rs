//! Movie tools exposed over MCP

use crate::catalog::MovieRecord;
use crate::mcp::protocol::{CallToolParams, CallToolResult, Tool};
use crate::mcp::server::ToolHandler;
use crate::recommend::Recommender;
use crate::recommend::display::DisplayConfig;
use anyhow::Result;
use async_trait::async_trait;
use serde_json::{Value, json};
use std::collections::HashMap;
use std::sync::Arc;
use tracing::debug;

/// Default number of titles returned by list_movies
const DEFAULT_LIST_LIMIT: usize = 50;

/// Top-k similar movies for a title
pub struct RecommendMoviesHandler {
    recommender: Arc<Recommender>,
    display: DisplayConfig,
}

/// Catalog titles, optionally filtered
pub struct ListMoviesHandler {
    recommender: Arc<Recommender>,
}

/// Full record of one movie
pub struct GetMovieHandler {
    recommender: Arc<Recommender>,
}

fn string_arg<'a>(args: &'a HashMap<String, Value>, name: &str) -> Option<&'a str> {
    args.get(name).and_then(Value::as_str)
}

fn limit_arg(args: &HashMap<String, Value>) -> Option<usize> {
    args.get("limit")
        .and_then(Value::as_u64)
        .and_then(|limit| usize::try_from(limit).ok())
        .map(|limit| limit.max(1))
}

fn json_result(value: &Value) -> Result<CallToolResult> {
    Ok(CallToolResult::text(serde_json::to_string_pretty(value)?))
}

fn movie_json(movie: &MovieRecord) -> Value {
    json!({
        "title": movie.title,
        "rating": movie.rating,
        "genre": movie.genre,
        "director": movie.director,
        "star": movie.star,
        "poster_path": movie.poster_path,
        "overview": movie.overview,
    })
}

impl RecommendMoviesHandler {
    #[inline]
    pub fn new(recommender: Arc<Recommender>, display: DisplayConfig) -> Self {
        Self {
            recommender,
            display,
        }
    }

    /// Create the recommend_movies tool definition
    #[inline]
    pub fn tool_definition() -> Tool {
        Tool {
            name: "recommend_movies".to_string(),
            description: Some(
                "Recommend movies similar to a catalog title, ranked by content similarity"
                    .to_string(),
            ),
            input_schema: json!({
                "type": "object",
                "properties": {
                    "title": {
                        "type": "string",
                        "description": "Exact catalog title"
                    },
                    "limit": {
                        "type": "integer",
                        "description": "Maximum number of results (default: 5)"
                    }
                },
                "required": ["title"],
                "additionalProperties": false
            }),
        }
    }
}

#[async_trait]
impl ToolHandler for RecommendMoviesHandler {
    #[inline]
    async fn handle(&self, params: CallToolParams) -> Result<CallToolResult> {
        let args = params.arguments.unwrap_or_default();
        let Some(title) = string_arg(&args, "title") else {
            return Ok(CallToolResult::error(
                "Missing required parameter: title".to_string(),
            ));
        };
        let limit = limit_arg(&args).unwrap_or_else(|| self.recommender.top_k());

        debug!("Recommending for '{}' (limit {})", title, limit);

        match self.recommender.recommend_with_limit(title, limit) {
            Ok(recommendations) => {
                let results = recommendations
                    .iter()
                    .map(|r| {
                        let mut entry = movie_json(r.movie);
                        entry["score"] = json!(r.score);
                        entry["match_percent"] = json!(self.display.match_percent(r.score));
                        entry
                    })
                    .collect::<Vec<_>>();
                json_result(&json!({ "title": title, "recommendations": results }))
            }
            Err(e) => Ok(CallToolResult::error(format!(
                "{e}. Use list_movies to find available titles."
            ))),
        }
    }
}

impl ListMoviesHandler {
    #[inline]
    pub fn new(recommender: Arc<Recommender>) -> Self {
        Self { recommender }
    }

    /// Create the list_movies tool definition
    #[inline]
    pub fn tool_definition() -> Tool {
        Tool {
            name: "list_movies".to_string(),
            description: Some("List catalog titles".to_string()),
            input_schema: json!({
                "type": "object",
                "properties": {
                    "query": {
                        "type": "string",
                        "description": "Optional: case-insensitive substring to match in titles"
                    },
                    "limit": {
                        "type": "integer",
                        "description": "Maximum number of titles (default: 50)"
                    }
                },
                "additionalProperties": false
            }),
        }
    }
}

#[async_trait]
impl ToolHandler for ListMoviesHandler {
    #[inline]
    async fn handle(&self, params: CallToolParams) -> Result<CallToolResult> {
        let args = params.arguments.unwrap_or_default();
        let query = string_arg(&args, "query").map(str::to_lowercase);
        let limit = limit_arg(&args).unwrap_or(DEFAULT_LIST_LIMIT);

        let matching = matching_titles(self.recommender.catalog().titles(), query.as_deref());
        let total = matching.len();
        let titles = matching.into_iter().take(limit).collect::<Vec<_>>();

        json_result(&json!({ "total": total, "titles": titles }))
    }
}

/// Titles containing `query` (already lowercased), in catalog order
#[inline]
pub fn matching_titles<'a>(
    titles: impl Iterator<Item = &'a str>,
    query: Option<&str>,
) -> Vec<&'a str> {
    titles
        .filter(|title| query.is_none_or(|q| title.to_lowercase().contains(q)))
        .collect()
}

impl GetMovieHandler {
    #[inline]
    pub fn new(recommender: Arc<Recommender>) -> Self {
        Self { recommender }
    }

    /// Create the get_movie tool definition
    #[inline]
    pub fn tool_definition() -> Tool {
        Tool {
            name: "get_movie".to_string(),
            description: Some("Get the full catalog record of a movie".to_string()),
            input_schema: json!({
                "type": "object",
                "properties": {
                    "title": {
                        "type": "string",
                        "description": "Exact catalog title"
                    }
                },
                "required": ["title"],
                "additionalProperties": false
            }),
        }
    }
}

#[async_trait]
impl ToolHandler for GetMovieHandler {
    #[inline]
    async fn handle(&self, params: CallToolParams) -> Result<CallToolResult> {
        let args = params.arguments.unwrap_or_default();
        let Some(title) = string_arg(&args, "title") else {
            return Ok(CallToolResult::error(
                "Missing required parameter: title".to_string(),
            ));
        };

        match self.recommender.movie(title) {
            Ok(movie) => json_result(&movie_json(movie)),
            Err(e) => Ok(CallToolResult::error(e.to_string())),
        }
    }
}

/// Server with the three movie tools registered
#[inline]
pub async fn movie_server(
    recommender: &Arc<Recommender>,
    display: DisplayConfig,
) -> crate::mcp::McpServer {
    let server = crate::mcp::McpServer::new(
        env!("CARGO_PKG_NAME").to_string(),
        env!("CARGO_PKG_VERSION").to_string(),
    );

    server
        .register_tool(
            RecommendMoviesHandler::tool_definition(),
            RecommendMoviesHandler::new(Arc::clone(recommender), display),
        )
        .await;
    server
        .register_tool(
            ListMoviesHandler::tool_definition(),
            ListMoviesHandler::new(Arc::clone(recommender)),
        )
        .await;
    server
        .register_tool(
            GetMovieHandler::tool_definition(),
            GetMovieHandler::new(Arc::clone(recommender)),
        )
        .await;

    server
}
