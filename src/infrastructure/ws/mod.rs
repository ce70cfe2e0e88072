// Push channel - platform websocket protocol and subscription lifecycle
pub mod protocol;
pub mod subscription;
