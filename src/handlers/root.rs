pub async fn root_endpoint() -> &'static str {
    "Welcome to the healthstream service!"
}
