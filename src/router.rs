/// Router collaborator. Injected by the host shell; when absent, the manager
/// logs that the host must perform the post-logout navigation itself.
pub trait Navigator: Send + Sync {
    fn push(&self, path: &str);
}
