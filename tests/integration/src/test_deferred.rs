//! Deferred-result endpoints.

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use bsdtools_auth::QueryParams;

    use crate::live_client;

    #[tokio::test]
    #[ignore = "requires live BSD Tools credentials"]
    async fn test_should_resolve_deferred_group_listing() {
        let mut client = live_client();
        client.set_deferred_result_interval(Duration::from_secs(2));

        // get_constituents is always answered with a deferred id.
        let query: QueryParams = [("filter", "cons_group=1"), ("bundles", "primary_cons_email")]
            .into_iter()
            .collect();
        let response = client
            .get("cons/get_constituents", query)
            .await
            .expect("deferred result resolved");

        assert!(
            matches!(response.status(), 200 | 204),
            "status {} body {}",
            response.status(),
            response.text()
        );
    }

    #[tokio::test]
    #[ignore = "requires live BSD Tools credentials"]
    async fn test_should_return_raw_202_when_deferred_disabled() {
        let mut client = live_client();
        client.set_process_deferred_results(false);

        let query: QueryParams = [("filter", "cons_group=1")].into_iter().collect();
        let response = client
            .get("cons/get_constituents", query)
            .await
            .expect("signed request accepted");

        assert_eq!(response.status(), 202);
        assert!(!response.text().is_empty(), "202 body carries the deferred id");
    }
}
