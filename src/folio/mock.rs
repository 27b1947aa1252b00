//! In-memory stand-in for the platform, used by tests

use super::{query, ApiError, ApiResponse, FolioApi};
use super::{
    EXPENSE_CLASSES_PATH, FISCAL_YEARS_PATH, FUNDS_PATH, ITEMS_PATH, PO_LINES_PATH,
    TRANSACTIONS_PATH,
};
use async_trait::async_trait;
use serde_json::{json, Value};
use std::collections::{HashMap, HashSet, VecDeque};
use tokio::sync::Mutex;

/// A call observed by the mock
#[derive(Debug, Clone, PartialEq)]
pub struct MockCall {
    pub method: String,
    pub path: String,
    pub query: Option<String>,
    pub body: Option<Value>,
}

/// Mock implementation of FolioApi.
///
/// Records live at `{collection}/{id}`. Searches map a `(collection, query)`
/// pair to record paths and are answered from the current record state, so
/// a successful PUT is visible to later lookups.
pub struct MockFolioClient {
    records: Mutex<HashMap<String, Value>>,
    searches: Mutex<HashMap<(String, String), Vec<String>>>,
    put_responses: Mutex<HashMap<String, VecDeque<ApiResponse>>>,
    post_responses: Mutex<HashMap<String, VecDeque<ApiResponse>>>,
    unreachable: Mutex<HashSet<String>>,
    calls: Mutex<Vec<MockCall>>,
}

fn collection_key(path: &str) -> &'static str {
    match path {
        PO_LINES_PATH => "poLines",
        ITEMS_PATH => "items",
        TRANSACTIONS_PATH => "transactions",
        FUNDS_PATH => "funds",
        FISCAL_YEARS_PATH => "fiscalYears",
        EXPENSE_CLASSES_PATH => "expenseClasses",
        _ => "records",
    }
}

fn record_id(record: &Value) -> String {
    record
        .get("id")
        .and_then(Value::as_str)
        .unwrap_or_default()
        .to_string()
}

impl MockFolioClient {
    pub fn new() -> Self {
        Self {
            records: Mutex::new(HashMap::new()),
            searches: Mutex::new(HashMap::new()),
            put_responses: Mutex::new(HashMap::new()),
            post_responses: Mutex::new(HashMap::new()),
            unreachable: Mutex::new(HashSet::new()),
            calls: Mutex::new(Vec::new()),
        }
    }

    /// Store a record and list it under the collection's unfiltered listing
    pub async fn add_record(&self, collection: &str, record: Value) -> String {
        let path = format!("{}/{}", collection, record_id(&record));
        self.records.lock().await.insert(path.clone(), record);
        self.searches
            .lock()
            .await
            .entry((collection.to_string(), String::new()))
            .or_default()
            .push(path.clone());
        path
    }

    /// Make `query` on `collection` return the given records, in order
    pub async fn add_search(&self, collection: &str, query: &str, records: Vec<Value>) {
        let mut paths = Vec::new();
        for record in records {
            let path = format!("{}/{}", collection, record_id(&record));
            self.records.lock().await.entry(path.clone()).or_insert(record);
            paths.push(path);
        }
        self.searches
            .lock()
            .await
            .entry((collection.to_string(), query.to_string()))
            .or_default()
            .extend(paths);
    }

    /// Store a POL and make it findable by its line number
    pub async fn add_po_line(&self, pol: Value) {
        let number = pol
            .get("poLineNumber")
            .and_then(Value::as_str)
            .unwrap_or_default()
            .to_string();
        let path = self.add_record(PO_LINES_PATH, pol).await;
        self.searches
            .lock()
            .await
            .entry((PO_LINES_PATH.to_string(), query::po_line_by_number(&number)))
            .or_default()
            .push(path);
    }

    pub async fn add_item(&self, item: Value) {
        let barcode = item
            .get("barcode")
            .and_then(Value::as_str)
            .unwrap_or_default()
            .to_string();
        let path = self.add_record(ITEMS_PATH, item).await;
        self.searches
            .lock()
            .await
            .entry((ITEMS_PATH.to_string(), query::item_by_barcode(&barcode)))
            .or_default()
            .push(path);
    }

    /// Queue the response for the next PUT to `path` (default: 204)
    pub async fn add_put_response(&self, path: &str, response: ApiResponse) {
        self.put_responses
            .lock()
            .await
            .entry(path.to_string())
            .or_default()
            .push_back(response);
    }

    /// Queue the response for the next POST to `path` (default: 204)
    pub async fn add_post_response(&self, path: &str, response: ApiResponse) {
        self.post_responses
            .lock()
            .await
            .entry(path.to_string())
            .or_default()
            .push_back(response);
    }

    /// Every call touching `path` fails as if the host were down
    pub async fn set_unreachable(&self, path: &str) {
        self.unreachable.lock().await.insert(path.to_string());
    }

    pub async fn record(&self, path: &str) -> Option<Value> {
        self.records.lock().await.get(path).cloned()
    }

    pub async fn get_calls(&self) -> Vec<MockCall> {
        self.calls.lock().await.clone()
    }

    pub async fn writes(&self) -> Vec<MockCall> {
        self.calls
            .lock()
            .await
            .iter()
            .filter(|c| c.method != "GET")
            .cloned()
            .collect()
    }

    async fn track(&self, method: &str, path: &str, query: Option<&str>, body: Option<&Value>) {
        self.calls.lock().await.push(MockCall {
            method: method.to_string(),
            path: path.to_string(),
            query: query.map(str::to_string),
            body: body.cloned(),
        });
    }

    async fn check_reachable(&self, path: &str) -> Result<(), ApiError> {
        let unreachable = self.unreachable.lock().await;
        if unreachable.iter().any(|p| path.starts_with(p.as_str())) {
            return Err(ApiError::Transport {
                url: path.to_string(),
                message: "connection refused".to_string(),
            });
        }
        Ok(())
    }

    async fn search(&self, path: &str, query: &str) -> Vec<Value> {
        let searches = self.searches.lock().await;
        let records = self.records.lock().await;
        searches
            .get(&(path.to_string(), query.to_string()))
            .map(|paths| paths.iter().filter_map(|p| records.get(p).cloned()).collect())
            .unwrap_or_default()
    }

    fn next_response(
        queue: &mut HashMap<String, VecDeque<ApiResponse>>,
        path: &str,
    ) -> ApiResponse {
        queue
            .get_mut(path)
            .and_then(VecDeque::pop_front)
            .unwrap_or_else(|| ApiResponse::new(204, ""))
    }
}

impl Default for MockFolioClient {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl FolioApi for MockFolioClient {
    async fn get_json(&self, path: &str, query: Option<&str>) -> Result<Value, ApiError> {
        self.track("GET", path, query, None).await;
        self.check_reachable(path).await?;

        match query {
            Some(q) => {
                let found = self.search(path, q).await;
                let total = found.len();
                let mut page = serde_json::Map::new();
                page.insert(collection_key(path).to_string(), Value::Array(found));
                page.insert("totalRecords".to_string(), json!(total));
                Ok(Value::Object(page))
            }
            None => self
                .records
                .lock()
                .await
                .get(path)
                .cloned()
                .ok_or_else(|| ApiError::Status {
                    status: 404,
                    body: format!("{} not found", path),
                }),
        }
    }

    async fn get_all(
        &self,
        path: &str,
        _key: &str,
        query: Option<&str>,
    ) -> Result<Vec<Value>, ApiError> {
        self.track("GET", path, query, None).await;
        self.check_reachable(path).await?;
        Ok(self.search(path, query.unwrap_or_default()).await)
    }

    async fn put_json(&self, path: &str, body: &Value) -> Result<ApiResponse, ApiError> {
        self.track("PUT", path, None, Some(body)).await;
        self.check_reachable(path).await?;

        let response = Self::next_response(&mut *self.put_responses.lock().await, path);
        if response.is_success() {
            self.records
                .lock()
                .await
                .insert(path.to_string(), body.clone());
        }
        Ok(response)
    }

    async fn post_json(&self, path: &str, body: &Value) -> Result<ApiResponse, ApiError> {
        self.track("POST", path, None, Some(body)).await;
        self.check_reachable(path).await?;
        Ok(Self::next_response(
            &mut *self.post_responses.lock().await,
            path,
        ))
    }
}
