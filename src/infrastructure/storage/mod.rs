mod object_store_blob;

pub use object_store_blob::ObjectStoreBlobStore;
