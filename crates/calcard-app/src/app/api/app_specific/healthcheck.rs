//! Liveness endpoint, outside authentication.

use salvo::handler;

#[handler]
pub async fn healthcheck(res: &mut salvo::Response) {
    res.render(salvo::writing::Text::Plain("ok"));
}
