use super::{Facet, Issue, Severity};
use serde::{Deserialize, Serialize};

/// Query filters accepted by `api/issues/search`.
///
/// Every field is optional; only populated fields end up in the query string.
/// List-valued filters are sent as comma-separated values.
#[derive(Debug, Clone, Serialize, Default, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct IssuesSearchOptions {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub branch: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub organization: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub pull_request: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub additional_fields: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub asc: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub assigned: Option<bool>,
    /// Assignee logins; `__me__` stands for the authenticated user.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub assignees: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub authors: Option<String>,
    /// Projects, modules, directories or files whose issues are returned.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub component_keys: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub component_root_uuids: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub component_roots: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub component_uuids: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub components: Option<String>,
    /// Date (`2017-10-19`) or datetime (`2017-10-19T13:00:00+0200`), inclusive.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub created_after: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub created_at: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub created_before: Option<String>,
    /// Span such as `1m2w`; must not be combined with `created_after`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub created_in_last: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub issues: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub languages: Option<String>,
    /// 1-based page number.
    #[serde(rename = "p", skip_serializing_if = "Option::is_none")]
    pub page: Option<u32>,
    /// Page size, 1..=500 on the server side.
    #[serde(rename = "ps", skip_serializing_if = "Option::is_none")]
    pub page_size: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub resolutions: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub resolved: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub rules: Option<String>,
    /// Sort field.
    #[serde(rename = "s", skip_serializing_if = "Option::is_none")]
    pub sort: Option<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub severities: Vec<Severity>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub since_leak_period: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub statuses: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tags: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub types: Option<String>,
}

impl IssuesSearchOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn component_keys(mut self, keys: impl Into<String>) -> Self {
        self.component_keys = Some(keys.into());
        self
    }

    pub fn severity(mut self, severity: Severity) -> Self {
        if !self.severities.contains(&severity) {
            self.severities.push(severity);
        }
        self
    }

    pub fn resolved(mut self, resolved: bool) -> Self {
        self.resolved = Some(resolved);
        self
    }

    pub fn page(mut self, page: u32) -> Self {
        self.page = Some(page);
        self
    }

    pub fn page_size(mut self, page_size: u32) -> Self {
        self.page_size = Some(page_size);
        self
    }

    pub fn since_leak_period(mut self, since: bool) -> Self {
        self.since_leak_period = Some(since);
        self
    }

    pub fn types(mut self, types: impl Into<String>) -> Self {
        self.types = Some(types.into());
        self
    }

    pub fn statuses(mut self, statuses: impl Into<String>) -> Self {
        self.statuses = Some(statuses.into());
        self
    }

    /// Query parameters in key order. Absent or empty options produce no pair at all.
    pub fn to_query_pairs(&self) -> crate::Result<Vec<(String, String)>> {
        let value = serde_json::to_value(self)?;
        let serde_json::Value::Object(map) = value else {
            return Err(crate::Error::Unexpected(
                "search options did not serialize to an object".to_string(),
            ));
        };

        let mut pairs: Vec<(String, String)> = map
            .into_iter()
            .map(|(key, value)| (key, query_value(value)))
            .filter(|(_, value)| !value.is_empty())
            .collect();
        pairs.sort_by(|a, b| a.0.cmp(&b.0));
        Ok(pairs)
    }
}

fn query_value(value: serde_json::Value) -> String {
    match value {
        serde_json::Value::String(s) => s,
        serde_json::Value::Array(items) => items
            .into_iter()
            .map(query_value)
            .collect::<Vec<_>>()
            .join(","),
        other => other.to_string(),
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct Paging {
    pub page_index: u32,
    pub page_size: u32,
    pub total: u64,
}

/// Body of a successful `api/issues/search` response.
///
/// Unknown fields are rejected so that API changes surface as decode errors.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct IssuesSearchResult {
    pub total: u64,

    #[serde(default)]
    pub issues: Vec<Issue>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub p: Option<u32>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ps: Option<u32>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub paging: Option<Paging>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub effort_total: Option<u64>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub debt_total: Option<u64>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub components: Vec<serde_json::Value>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub rules: Vec<serde_json::Value>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub users: Vec<serde_json::Value>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub facets: Vec<Facet>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_search_options_builder() {
        let options = IssuesSearchOptions::new()
            .component_keys("my_project")
            .severity(Severity::Major)
            .severity(Severity::Major)
            .resolved(false)
            .page_size(1);

        assert_eq!(options.component_keys.as_deref(), Some("my_project"));
        assert_eq!(options.severities, vec![Severity::Major]);
        assert_eq!(options.resolved, Some(false));
        assert_eq!(options.page_size, Some(1));
    }

    #[test]
    fn test_query_pairs_skip_unset_options() {
        let options = IssuesSearchOptions::new()
            .component_keys("my_project")
            .severity(Severity::Blocker)
            .resolved(false)
            .page_size(1);

        let pairs = options.to_query_pairs().unwrap();

        assert_eq!(
            pairs,
            vec![
                ("componentKeys".to_string(), "my_project".to_string()),
                ("ps".to_string(), "1".to_string()),
                ("resolved".to_string(), "false".to_string()),
                ("severities".to_string(), "BLOCKER".to_string()),
            ]
        );
    }

    #[test]
    fn test_query_pairs_join_severities_and_rename_short_keys() {
        let options = IssuesSearchOptions {
            severities: vec![Severity::Blocker, Severity::Critical],
            page: Some(3),
            sort: Some("SEVERITY".to_string()),
            pull_request: Some("42".to_string()),
            since_leak_period: Some(true),
            ..Default::default()
        };

        let pairs = options.to_query_pairs().unwrap();

        assert!(pairs.contains(&("severities".to_string(), "BLOCKER,CRITICAL".to_string())));
        assert!(pairs.contains(&("p".to_string(), "3".to_string())));
        assert!(pairs.contains(&("s".to_string(), "SEVERITY".to_string())));
        assert!(pairs.contains(&("pullRequest".to_string(), "42".to_string())));
        assert!(pairs.contains(&("sinceLeakPeriod".to_string(), "true".to_string())));
        assert_eq!(pairs.len(), 5);
    }

    #[test]
    fn test_query_pairs_skip_empty_strings() {
        let options = IssuesSearchOptions {
            branch: Some(String::new()),
            types: Some(String::new()),
            organization: Some("my-org".to_string()),
            ..Default::default()
        };

        let pairs = options.to_query_pairs().unwrap();

        assert_eq!(
            pairs,
            vec![("organization".to_string(), "my-org".to_string())]
        );
    }

    #[test]
    fn test_empty_options_have_no_query_pairs() {
        let pairs = IssuesSearchOptions::new().to_query_pairs().unwrap();
        assert!(pairs.is_empty());
    }

    #[test]
    fn test_search_result_minimal_body() {
        let result: IssuesSearchResult =
            serde_json::from_value(json!({"total": 7, "issues": []})).unwrap();

        assert_eq!(result.total, 7);
        assert!(result.issues.is_empty());
        assert!(result.paging.is_none());
    }

    #[test]
    fn test_search_result_full_body() {
        let json_data = json!({
            "total": 1,
            "p": 1,
            "ps": 100,
            "paging": {"pageIndex": 1, "pageSize": 100, "total": 1},
            "effortTotal": 5,
            "debtTotal": 5,
            "issues": [{
                "key": "AU-Tpxb--iU5OvuD2FLy",
                "rule": "squid:S1067",
                "severity": "MAJOR",
                "component": "my_project:src/Main.java",
                "project": "my_project",
                "line": 81,
                "status": "OPEN",
                "message": "Reduce the number of conditional operators (4) used in the expression",
                "effort": "5min",
                "tags": ["brain-overload"],
                "creationDate": "2013-05-13T17:55:39+0200",
                "updateDate": "2013-05-13T17:55:39+0200",
                "type": "CODE_SMELL"
            }],
            "components": [{"key": "my_project", "qualifier": "TRK"}],
            "facets": [{"property": "severities", "values": [{"val": "MAJOR", "count": 1}]}]
        });

        let result: IssuesSearchResult = serde_json::from_value(json_data).unwrap();

        assert_eq!(result.total, 1);
        assert_eq!(result.paging.as_ref().map(|p| p.page_size), Some(100));
        assert_eq!(result.issues[0].severity, Some(Severity::Major));
        assert_eq!(result.components.len(), 1);
        assert_eq!(result.facets[0].values[0].count, 1);
    }

    #[test]
    fn test_search_result_rejects_unknown_field() {
        let json_data = json!({"total": 7, "issues": [], "somethingNew": true});

        let result: Result<IssuesSearchResult, _> = serde_json::from_value(json_data);

        let err = result.unwrap_err();
        assert!(err.to_string().contains("somethingNew"));
    }

    #[test]
    fn test_search_result_requires_total() {
        let result: Result<IssuesSearchResult, _> = serde_json::from_value(json!({"issues": []}));
        assert!(result.is_err());
    }
}
