use endpoint_dispatch::{DispatchResult, DispatcherConfig, Method, RequestDispatcher, RequestParams};
use sonic_rs::Value;

async fn fetch(dispatcher: &RequestDispatcher) -> DispatchResult<Value> {
    dispatcher
        .dispatch("getModel", RequestParams::new().with_param("id", 42), Method::GET)
        .await
}

fn assert_send<F: std::future::Future + Send>(_future: F) {}

fn main() {
    let dispatcher = RequestDispatcher::new(DispatcherConfig::default(), Default::default())
        .expect("default config is valid");
    assert_send(fetch(&dispatcher));
}
