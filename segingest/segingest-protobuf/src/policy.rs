/// How unset protobuf fields are represented in decoded values.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PresencePolicy {
    /// Read every field through protobuf default semantics.
    ///
    /// Unset fields decode as their default and no field is nullable.
    AlwaysDefault,
    /// Fields that track presence decode as `Value::Null` when unset.
    ///
    /// This is what keeps inactive union members out of the sample stream.
    #[default]
    PresenceAware,
}
