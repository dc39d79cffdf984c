/// Generates the read endpoints of a backend resource on [`ApiClient`](crate::api::ApiClient):
/// `list_<name>s` always, plus `get_<name>(id)` when a detail path is given.
/// Paths are relative to the base URL; the detail path takes the id as `{}`.
#[macro_export]
macro_rules! impl_resource_reads {
    ($entity:ty, $name:ident, list: $list_path:literal) => {
        paste::paste! {
            impl $crate::api::ApiClient {
                #[tracing::instrument(skip(self))]
                pub async fn [<list_ $name s>](&self) -> Result<Vec<$entity>, $crate::error::ApiError> {
                    tracing::debug!("Sending request");
                    self.get_list::<$entity>($list_path).await
                }
            }
        }
    };
    ($entity:ty, $name:ident, list: $list_path:literal, get: $get_path:literal) => {
        $crate::impl_resource_reads!($entity, $name, list: $list_path);

        paste::paste! {
            impl $crate::api::ApiClient {
                #[tracing::instrument(skip(self))]
                pub async fn [<get_ $name>](&self, id: u64) -> Result<$entity, $crate::error::ApiError> {
                    tracing::debug!("Sending request");
                    self.get_one::<$entity>(&format!($get_path, id)).await
                }
            }
        }
    };
}
