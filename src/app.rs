// Route wiring and gateway bootstrap

use crate::dispatch::HookDispatcher;
use crate::error::{DispatchError, GatewayError};
use hookwire_config::GatewayConfig;
use hookwire_core::{HandlerFn, HandlerFuture, HttpRequest, HttpResponse, Method, Router};
use hookwire_translators::{TranslatorFactory, TranslatorRegistry};
use std::path::Path;
use std::sync::Arc;
use tracing::{error, info, warn};

/// Methods a hook answers on
pub const HOOK_METHODS: &[Method] = &[Method::GET, Method::POST, Method::PUT];

/// Load the configuration at `path` and build the gateway's router.
///
/// Every hook is resolved here, so a misconfigured translator stops startup
/// instead of failing its first request.
pub fn load(path: impl AsRef<Path>) -> Result<Router, GatewayError> {
    let path = path.as_ref();
    let config = GatewayConfig::load(path)?;
    info!(
        config = %path.display(),
        templates = %config.template_dir().display(),
        "Configuration loaded"
    );
    build(config, TranslatorFactory::with_defaults())
}

/// Build the router from an already parsed configuration
pub fn build(config: GatewayConfig, factory: TranslatorFactory) -> Result<Router, GatewayError> {
    let registry = TranslatorRegistry::new(Arc::new(config), factory);
    let dispatcher = HookDispatcher::new(&registry)?;
    Ok(build_router(Arc::new(dispatcher)))
}

pub fn build_router(dispatcher: Arc<HookDispatcher>) -> Router {
    let mut router = Router::new();

    let index: HandlerFn = {
        let dispatcher = Arc::clone(&dispatcher);
        Arc::new(move |_req: HttpRequest| {
            let dispatcher = Arc::clone(&dispatcher);
            Box::pin(async move { Ok(respond(dispatcher.index())) }) as HandlerFuture
        })
    };
    router.add_methods(&[Method::GET], "/", index.clone());
    router.add_methods(&[Method::GET], "/hook", index);

    let hook: HandlerFn = Arc::new(move |req: HttpRequest| {
        let dispatcher = Arc::clone(&dispatcher);
        Box::pin(async move {
            let name = req.param("name").cloned().unwrap_or_default();
            Ok(respond(dispatcher.dispatch(&name, &req).await))
        }) as HandlerFuture
    });
    router.add_methods(HOOK_METHODS, "/hook/:name", hook);

    router
}

fn respond(result: Result<HttpResponse, DispatchError>) -> HttpResponse {
    match result {
        Ok(response) => response,
        Err(err) => {
            if err.status_code() >= 500 {
                error!(error = %err, "Hook request failed");
            } else {
                warn!(error = %err, "Hook request rejected");
            }
            err.into_response()
        }
    }
}
