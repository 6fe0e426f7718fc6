//! # Tester Service
//!
//! **INTERNAL USE ONLY**: This crate exists solely to provide a Protobuf schema
//! (descriptor pool plus message helpers) for integration testing the
//! `protorest_core` library. It is not intended for production use.
//!
//! The schema is assembled programmatically from `prost-types` structs so that
//! tests do not require `protoc` at build time. It describes the following
//! proto2 file:
//!
//! ```protobuf
//! package tester;
//!
//! message Tester {
//!     optional int32 id = 1;
//!     optional string name = 2;
//!     repeated string tags = 3;
//!     extensions 100 to 199;
//! }
//!
//! extend Tester {
//!     optional string nickname = 100;
//! }
//! ```

use prost_reflect::{DescriptorPool, DynamicMessage, ExtensionDescriptor, MessageDescriptor, Value};
use prost_types::{
    DescriptorProto, FieldDescriptorProto, FileDescriptorProto, FileDescriptorSet,
    descriptor_proto::ExtensionRange,
    field_descriptor_proto::{Label, Type},
};

/// Builds the `FileDescriptorSet` describing the `tester` package.
pub fn file_descriptor_set() -> FileDescriptorSet {
    let tester = DescriptorProto {
        name: Some("Tester".to_string()),
        field: vec![
            field("id", 1, Type::Int32, Label::Optional),
            field("name", 2, Type::String, Label::Optional),
            field("tags", 3, Type::String, Label::Repeated),
        ],
        extension_range: vec![ExtensionRange {
            start: Some(100),
            end: Some(200),
            ..ExtensionRange::default()
        }],
        ..DescriptorProto::default()
    };

    let nickname = FieldDescriptorProto {
        extendee: Some(".tester.Tester".to_string()),
        ..field("nickname", 100, Type::String, Label::Optional)
    };

    let file = FileDescriptorProto {
        name: Some("tester.proto".to_string()),
        package: Some("tester".to_string()),
        syntax: Some("proto2".to_string()),
        message_type: vec![tester],
        extension: vec![nickname],
        ..FileDescriptorProto::default()
    };

    FileDescriptorSet { file: vec![file] }
}

/// Builds a fresh `DescriptorPool` containing the `tester` package.
pub fn descriptor_pool() -> DescriptorPool {
    DescriptorPool::from_file_descriptor_set(file_descriptor_set())
        .expect("tester descriptor set is well formed")
}

/// Looks up the `tester.Tester` message descriptor.
pub fn tester_descriptor(pool: &DescriptorPool) -> MessageDescriptor {
    pool.get_message_by_name("tester.Tester")
        .expect("tester.Tester is registered in the pool")
}

/// Looks up the `tester.nickname` extension descriptor.
pub fn nickname_extension(pool: &DescriptorPool) -> ExtensionDescriptor {
    pool.get_extension_by_name("tester.nickname")
        .expect("tester.nickname is registered in the pool")
}

/// Builds a `tester.Tester` message with the given regular fields populated.
pub fn tester(pool: &DescriptorPool, id: i32, name: &str) -> DynamicMessage {
    let mut msg = DynamicMessage::new(tester_descriptor(pool));
    msg.set_field_by_name("id", Value::I32(id));
    msg.set_field_by_name("name", Value::String(name.to_string()));
    msg
}

fn field(name: &str, number: i32, ty: Type, label: Label) -> FieldDescriptorProto {
    FieldDescriptorProto {
        name: Some(name.to_string()),
        number: Some(number),
        label: Some(label as i32),
        r#type: Some(ty as i32),
        ..FieldDescriptorProto::default()
    }
}
