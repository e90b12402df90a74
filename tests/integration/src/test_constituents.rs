//! Constituent and group lookups.

#[cfg(test)]
mod tests {
    use bsdtools_auth::QueryParams;

    use crate::live_client;

    #[tokio::test]
    #[ignore = "requires live BSD Tools credentials"]
    async fn test_should_get_constituent_by_id() {
        let client = live_client();
        let query: QueryParams = [("cons_ids", "1")].into_iter().collect();

        let response = client
            .get("cons/get_constituents_by_id", query)
            .await
            .expect("signed request accepted");

        assert_eq!(response.status(), 200, "body: {}", response.text());
    }

    #[tokio::test]
    #[ignore = "requires live BSD Tools credentials"]
    async fn test_should_list_constituent_groups() {
        let client = live_client();

        let response = client
            .get("cons_group/list_constituent_groups", QueryParams::new())
            .await
            .expect("signed request accepted");

        assert_eq!(response.status(), 200, "body: {}", response.text());
        assert!(!response.body().is_empty());
    }
}
