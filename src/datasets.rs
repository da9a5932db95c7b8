//! Feedback dataset endpoints (`/api/v1`).
//!
//! Every function performs exactly one blocking request and returns a
//! [`Response`] envelope. A non-success status is never an `Err`: inspect
//! [`Response::parsed`] (or call [`Response::into_result`]). `Err` is reserved
//! for transport failures and success bodies that do not decode.

use anyhow::Result;
use reqwest::{Method, StatusCode};
use serde::Serialize;
use serde::de::DeserializeOwned;
use std::sync::Arc;

use crate::client::Client;
use crate::models::{
    CreateDatasetRequest, Dataset, Field, ItemsRequest, ItemsResponse, Question, RecordsPage,
};
use crate::response::{Parsed, Response};

pub const DEFAULT_RECORDS_OFFSET: u64 = 0;
pub const DEFAULT_RECORDS_LIMIT: u64 = 50;

fn json<T: DeserializeOwned>(body: &[u8]) -> Result<Option<T>> {
    Ok(Some(serde_json::from_slice(body)?))
}

fn items<T: DeserializeOwned>(body: &[u8]) -> Result<Option<Vec<T>>> {
    let page: ItemsResponse<T> = serde_json::from_slice(body)?;
    Ok(Some(page.items))
}

fn empty<T>(_: &[u8]) -> Result<Option<T>> {
    Ok(None)
}

fn dataset_url(client: &Client, id: &str, suffix: Option<&str>) -> Result<String> {
    match suffix {
        Some(suffix) => client.api_url_segments(&["datasets", id, suffix]),
        None => client.api_url_segments(&["datasets", id]),
    }
}

fn invalidate(client: &Client, id: &str) {
    if let Some(cache) = client.dataset_cache() {
        cache.invalidate(client.id(), id);
    }
}

pub fn create_dataset(
    client: &Client,
    name: &str,
    workspace_id: &str,
    guidelines: Option<&str>,
) -> Result<Response<Dataset>> {
    let url = client.api_url("/datasets");
    let body = CreateDatasetRequest {
        name,
        workspace_id,
        guidelines,
    };
    let req = client.request(Method::POST, &url)?.json(&body);
    let resp = client.execute(req, StatusCode::CREATED, json::<Dataset>)?;

    if let Some(Parsed::Success(ds)) = &resp.parsed {
        invalidate(client, &ds.id);
    }
    Ok(resp)
}

/// Fetches a dataset, reading through the client's [`DatasetCache`] when one
/// is attached. Only successful responses are cached, and a cache hit returns
/// the same `Arc` as the original fetch.
///
/// [`DatasetCache`]: crate::DatasetCache
pub fn get_dataset(client: &Client, id: &str) -> Result<Arc<Response<Dataset>>> {
    let cache = client.dataset_cache();
    if let Some(hit) = cache.and_then(|cache| cache.get(client.id(), id)) {
        return Ok(hit);
    }
    // Taken before the request so an invalidation racing with it wins.
    let generation = cache.map(|cache| cache.generation());

    let url = dataset_url(client, id, None)?;
    let req = client.request(Method::GET, &url)?;
    let resp = Arc::new(client.execute(req, StatusCode::OK, json::<Dataset>)?);

    if let (Some(cache), Some(generation), Some(Parsed::Success(_))) =
        (cache, generation, &resp.parsed)
    {
        cache.insert_if_current(client.id(), id, Arc::clone(&resp), generation);
    }
    Ok(resp)
}

pub fn delete_dataset(client: &Client, id: &str) -> Result<Response<()>> {
    let url = dataset_url(client, id, None)?;
    let req = client.request(Method::DELETE, &url)?;
    let resp = client.execute(req, StatusCode::OK, empty::<()>);
    invalidate(client, id);
    resp
}

pub fn publish_dataset(client: &Client, id: &str) -> Result<Response<Dataset>> {
    let url = dataset_url(client, id, Some("publish"))?;
    let req = client.request(Method::PUT, &url)?;
    let resp = client.execute(req, StatusCode::OK, json::<Dataset>);
    invalidate(client, id);
    resp
}

/// Datasets visible to the authenticated user, in server order.
pub fn list_datasets(client: &Client) -> Result<Response<Vec<Dataset>>> {
    let url = client.api_url("/me/datasets");
    let req = client.request(Method::GET, &url)?;
    client.execute(req, StatusCode::OK, items::<Dataset>)
}

/// One page of records including their responses. `offset` defaults to 0 and
/// `limit` to 50.
pub fn get_records(
    client: &Client,
    id: &str,
    offset: Option<u64>,
    limit: Option<u64>,
) -> Result<Response<RecordsPage>> {
    let offset = offset.unwrap_or(DEFAULT_RECORDS_OFFSET);
    let limit = limit.unwrap_or(DEFAULT_RECORDS_LIMIT);

    let url = client.api_url_segments(&["me", "datasets", id, "records"])?;
    let req = client.request(Method::GET, &url)?.query(&[
        ("include", "responses".to_string()),
        ("offset", offset.to_string()),
        ("limit", limit.to_string()),
    ]);

    client.execute(req, StatusCode::OK, |body| {
        let mut page: RecordsPage = serde_json::from_slice(body)?;
        page.offset.get_or_insert(offset);
        page.limit.get_or_insert(limit);
        Ok(Some(page))
    })
}

pub fn add_record<T: Serialize>(client: &Client, id: &str, record: &T) -> Result<Response<()>> {
    add_records(client, id, std::slice::from_ref(record))
}

/// Adds several records in one request.
pub fn add_records<T: Serialize>(
    client: &Client,
    id: &str,
    records: &[T],
) -> Result<Response<()>> {
    let url = dataset_url(client, id, Some("records"))?;
    let req = client
        .request(Method::POST, &url)?
        .json(&ItemsRequest { items: records });
    client.execute(req, StatusCode::NO_CONTENT, empty::<()>)
}

pub fn get_fields(client: &Client, id: &str) -> Result<Response<Vec<Field>>> {
    let url = dataset_url(client, id, Some("fields"))?;
    let req = client.request(Method::GET, &url)?;
    client.execute(req, StatusCode::OK, items::<Field>)
}

pub fn add_field<T: Serialize>(client: &Client, id: &str, field: &T) -> Result<Response<()>> {
    let url = dataset_url(client, id, Some("fields"))?;
    let req = client.request(Method::POST, &url)?.json(field);
    client.execute(req, StatusCode::CREATED, empty::<()>)
}

pub fn get_questions(client: &Client, id: &str) -> Result<Response<Vec<Question>>> {
    let url = dataset_url(client, id, Some("questions"))?;
    let req = client.request(Method::GET, &url)?;
    client.execute(req, StatusCode::OK, items::<Question>)
}

pub fn add_question<T: Serialize>(
    client: &Client,
    id: &str,
    question: &T,
) -> Result<Response<()>> {
    let url = dataset_url(client, id, Some("questions"))?;
    let req = client.request(Method::POST, &url)?.json(question);
    client.execute(req, StatusCode::CREATED, empty::<()>)
}
