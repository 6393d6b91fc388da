//! Command protocol tests against a running TissDB Lite server.

#[cfg(test)]
mod tests {
    use serde_json::{Value, json};

    use crate::{CommandClient, test_collection_name};

    async fn seed(client: &CommandClient, collection: &str) {
        let reply = client
            .send(&json!({"action": "createCollection", "collectionName": collection}))
            .await
            .unwrap();
        assert_eq!(reply.status, 200);

        let reply = client
            .send(&json!({
                "action": "bulkInsert",
                "collectionName": collection,
                "items": [
                    {"name": "Alice", "age": 30, "role": "developer"},
                    {"name": "Bob", "age": 40, "role": "admin"},
                    {"name": "Charlie", "age": 30, "status": "active"},
                    {"name": "David", "age": 25, "status": "inactive"},
                    {"name": "Eve", "age": 35, "role": "developer", "status": "active"}
                ]
            }))
            .await
            .unwrap();
        assert_eq!(reply.status, 200);
    }

    fn names(body: &Value) -> Vec<&str> {
        body["data"]
            .as_array()
            .unwrap()
            .iter()
            .filter_map(|d| d["name"].as_str())
            .collect()
    }

    #[tokio::test]
    #[ignore = "requires a running TissDB Lite server"]
    async fn test_should_find_with_condition() {
        let client = CommandClient::new();
        let collection = test_collection_name("find");
        seed(&client, &collection).await;

        let reply = client
            .send(&json!({
                "action": "find",
                "collectionName": collection,
                "condition_string": "(age = 30 OR age = 25) AND status = \"active\""
            }))
            .await
            .unwrap();
        assert_eq!(reply.status, 200);
        assert_eq!(names(&reply.body), vec!["Charlie"]);
    }

    #[tokio::test]
    #[ignore = "requires a running TissDB Lite server"]
    async fn test_should_run_select_statement() {
        let client = CommandClient::new();
        let collection = test_collection_name("query");
        seed(&client, &collection).await;

        let reply = client
            .send(&json!({
                "action": "query",
                "statement": format!("SELECT * FROM {collection} WHERE age > 30")
            }))
            .await
            .unwrap();
        assert_eq!(reply.status, 200);
        assert_eq!(names(&reply.body), vec!["Bob", "Eve"]);
    }

    #[tokio::test]
    #[ignore = "requires a running TissDB Lite server"]
    async fn test_should_update_and_remove() {
        let client = CommandClient::new();
        let collection = test_collection_name("mutate");

        let reply = client
            .send(&json!({
                "action": "insert",
                "collectionName": collection,
                "item": {"name": "Frank", "age": 50}
            }))
            .await
            .unwrap();
        assert_eq!(reply.status, 200);
        let id = reply.body["data"]["_id"].as_str().unwrap().to_owned();

        let reply = client
            .send(&json!({
                "action": "update",
                "collectionName": collection,
                "item": {"_id": id, "age": 51}
            }))
            .await
            .unwrap();
        assert_eq!(reply.status, 200);
        assert_eq!(reply.body["data"]["age"], 51);
        assert_eq!(reply.body["data"]["name"], "Frank");

        let reply = client
            .send(&json!({"action": "remove", "collectionName": collection, "itemId": id}))
            .await
            .unwrap();
        assert_eq!(reply.body["message"], "Item removed.");

        let reply = client
            .send(&json!({"action": "exportCollection", "collectionName": collection}))
            .await
            .unwrap();
        assert_eq!(reply.body["data"], json!([]));
    }

    #[tokio::test]
    #[ignore = "requires a running TissDB Lite server"]
    async fn test_should_report_errors() {
        let client = CommandClient::new();

        let reply = client.post_raw("/command", "{oops".to_owned()).await.unwrap();
        assert_eq!(reply.status, 400);
        assert_eq!(reply.body["message"], "Invalid JSON body.");

        let reply = client.send(&json!({"action": "teleport"})).await.unwrap();
        assert_eq!(reply.status, 500);
        assert_eq!(reply.body["message"], "Unknown action: teleport");

        let reply = client
            .send(&json!({
                "action": "find",
                "collectionName": test_collection_name("missing"),
                "condition_string": ""
            }))
            .await
            .unwrap();
        assert_eq!(reply.status, 500);

        let reply = client.post_raw("/nowhere", "{}".to_owned()).await.unwrap();
        assert_eq!(reply.status, 404);
    }
}
