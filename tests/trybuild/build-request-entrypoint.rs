use endpoint_dispatch::{
    DispatcherConfig, Method, MockRestAdapter, RequestDispatcher, RequestParams,
};

fn main() {
    let dispatcher =
        RequestDispatcher::with_transport(DispatcherConfig::default(), MockRestAdapter::new())
            .expect("default config is valid");
    let request = dispatcher
        .build_request(
            "getModel",
            &RequestParams::new().with_param("id", 42),
            Method::GET,
        )
        .expect("known endpoint");
    assert_eq!(request.url, "https://api.example.com/user/42");
}
