//! Concurrent item fetching.

use futures::future::join_all;
use std::collections::HashMap;
use tracing::{info, warn};

use super::types::{Item, PreparationError, RequestTemplate};
use crate::client::{ApiRequest, RequestBody, RequestClient};
use crate::competitor::Competitor;
use crate::metrics::PREPARATION_RESULTS;

/// Fetch the item list of every active competitor.
///
/// All fetches run concurrently and each settles on its own. The returned map
/// has one entry per active competitor; a failed or malformed response yields
/// an empty list for that competitor.
pub async fn prepare(
    client: &dyn RequestClient,
    competitors: &[Competitor],
    template: &RequestTemplate,
) -> Result<HashMap<String, Vec<Item>>, PreparationError> {
    if template.url.trim().is_empty() {
        return Err(PreparationError::MissingUrl);
    }
    if competitors.is_empty() {
        return Err(PreparationError::NoCompetitors);
    }

    let requests: Vec<(String, ApiRequest)> = competitors
        .iter()
        .filter_map(|competitor| {
            competitor.headers().map(|headers| {
                (
                    competitor.name.clone(),
                    ApiRequest {
                        method: template.method,
                        url: template.url.clone(),
                        body: RequestBody::from_template(&template.body),
                        headers,
                    },
                )
            })
        })
        .collect();

    if requests.is_empty() {
        return Err(PreparationError::NoTokens);
    }

    info!(
        competitors = requests.len(),
        url = %template.url,
        "Sending preparation requests"
    );

    let fetches = requests.into_iter().map(|(name, request)| async move {
        let items = fetch_items(client, &name, request).await;
        (name, items)
    });

    let results: HashMap<String, Vec<Item>> = join_all(fetches).await.into_iter().collect();

    info!(
        competitors = results.len(),
        items = results.values().map(Vec::len).sum::<usize>(),
        "Preparation complete"
    );

    Ok(results)
}

async fn fetch_items(client: &dyn RequestClient, name: &str, request: ApiRequest) -> Vec<Item> {
    match client.send(request).await {
        Ok(response) if response.is_successful() => match response.parse_json_body() {
            Some(serde_json::Value::Array(values)) => {
                PREPARATION_RESULTS.with_label_values(&["ok"]).inc();
                values.into_iter().map(Item::new).collect()
            }
            _ => {
                PREPARATION_RESULTS.with_label_values(&["not_list"]).inc();
                warn!(competitor = name, "Preparation response is not a list");
                Vec::new()
            }
        },
        Ok(response) => {
            PREPARATION_RESULTS.with_label_values(&["failed"]).inc();
            warn!(
                competitor = name,
                reason = %response.failure_reason(),
                "Preparation request failed"
            );
            Vec::new()
        }
        Err(e) => {
            PREPARATION_RESULTS.with_label_values(&["error"]).inc();
            warn!(competitor = name, error = %e, "Preparation request error");
            Vec::new()
        }
    }
}
