use khata_core::WebsiteId;

/// Website (tenant) context for a request.
///
/// Immutable, set by the middleware, and required on every domain route.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct WebsiteContext {
    website_id: WebsiteId,
}

impl WebsiteContext {
    pub fn new(website_id: WebsiteId) -> Self {
        Self { website_id }
    }

    pub fn website_id(&self) -> WebsiteId {
        self.website_id
    }
}
