/// Query parameters understood by list endpoints.
///
/// The filter language of `q` resembles a MySQL `WHERE` clause, e.g.
/// `name=cluster-1`.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct QueryParams {
    pairs: Vec<(String, String)>,
}

impl QueryParams {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a filter condition. Repeated calls add further `q` values.
    pub fn add_q(mut self, q: impl Into<String>) -> Self {
        self.pairs.push(("q".to_owned(), q.into()));
        self
    }

    /// Maximum number of records to return (backend default 1000).
    pub fn limit(self, limit: u32) -> Self {
        self.set("limit", limit.to_string())
    }

    /// Offset of the first record; combine with `limit` to page.
    pub fn start(self, start: u32) -> Self {
        self.set("start", start.to_string())
    }

    /// Only return the number of matching records.
    pub fn count(self, count: bool) -> Self {
        self.set("count", count.to_string())
    }

    pub fn group_by(self, field: impl Into<String>) -> Self {
        self.set("groupBy", field)
    }

    /// Include `totalCount` next to the results.
    pub fn reply_with_count(self, reply_with_count: bool) -> Self {
        self.set("replyWithCount", reply_with_count.to_string())
    }

    pub fn filter_name(self, name: impl Into<String>) -> Self {
        self.set("filterName", name)
    }

    /// Sorts by a field: `+field` ascending, `-field` descending, a bare
    /// field ascending.
    pub fn sort(self, sort: &str) -> Self {
        let (field, direction) = if let Some(field) = sort.strip_prefix('+') {
            (field, "asc")
        } else if let Some(field) = sort.strip_prefix('-') {
            (field, "desc")
        } else {
            (sort, "asc")
        };
        self.set("sortDirection", direction).set("sort", field)
    }

    /// Restricts the returned fields.
    pub fn fields<I, S>(self, fields: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let joined = fields
            .into_iter()
            .map(|field| field.as_ref().to_owned())
            .collect::<Vec<_>>()
            .join(",");
        self.set("fields", joined)
    }

    /// Replaces every value of `key` with `value`.
    pub fn set(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        let key = key.into();
        self.pairs.retain(|(existing, _)| *existing != key);
        self.pairs.push((key, value.into()));
        self
    }

    /// Returns the first value of `key`.
    pub fn get(&self, key: &str) -> Option<&str> {
        self.pairs
            .iter()
            .find(|(existing, _)| existing == key)
            .map(|(_, value)| value.as_str())
    }

    pub fn is_empty(&self) -> bool {
        self.pairs.is_empty()
    }

    pub fn pairs(&self) -> &[(String, String)] {
        &self.pairs
    }

    pub(crate) fn into_pairs(self) -> Vec<(String, String)> {
        self.pairs
    }
}

#[cfg(test)]
mod tests {
    use crate::QueryParams;

    #[test]
    fn q_accumulates_other_keys_replace() {
        let params = QueryParams::new()
            .add_q("name=a")
            .add_q("status=Running")
            .limit(10)
            .limit(20);

        let qs: Vec<&str> = params
            .pairs()
            .iter()
            .filter(|(k, _)| k == "q")
            .map(|(_, v)| v.as_str())
            .collect();
        assert_eq!(qs, ["name=a", "status=Running"]);
        assert_eq!(params.get("limit"), Some("20"));
    }

    #[test]
    fn sort_direction_from_prefix() {
        let asc = QueryParams::new().sort("+createTime");
        assert_eq!(asc.get("sort"), Some("createTime"));
        assert_eq!(asc.get("sortDirection"), Some("asc"));

        let desc = QueryParams::new().sort("-createTime");
        assert_eq!(desc.get("sort"), Some("createTime"));
        assert_eq!(desc.get("sortDirection"), Some("desc"));

        let bare = QueryParams::new().sort("name");
        assert_eq!(bare.get("sortDirection"), Some("asc"));
    }

    #[test]
    fn flags_and_fields() {
        let params = QueryParams::new()
            .reply_with_count(true)
            .count(false)
            .start(5)
            .group_by("status")
            .filter_name("edge")
            .fields(["name", "id"]);
        assert_eq!(params.get("replyWithCount"), Some("true"));
        assert_eq!(params.get("count"), Some("false"));
        assert_eq!(params.get("start"), Some("5"));
        assert_eq!(params.get("groupBy"), Some("status"));
        assert_eq!(params.get("filterName"), Some("edge"));
        assert_eq!(params.get("fields"), Some("name,id"));
    }
}
