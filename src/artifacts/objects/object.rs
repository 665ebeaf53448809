use crate::artifacts::objects::object_id::ObjectId;
use crate::errors::Result;
use bytes::Bytes;

pub trait Packable {
    fn serialize(&self) -> Result<Bytes>;
}

pub trait Unpackable {
    /// Rebuild an object from the bytes stored under `oid`
    fn deserialize(oid: &ObjectId, data: &[u8]) -> Result<Self>
    where
        Self: Sized;
}

pub trait Object: Packable {
    fn object_id(&self) -> Result<ObjectId> {
        Ok(ObjectId::hash(&self.serialize()?))
    }
}
