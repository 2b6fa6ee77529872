use brisk_serde::{ByteReader, ByteWrite, ByteWriter, Serde, SerdeErr};

use crate::{
    actions::ActionCall,
    messages::{
        delivery::{Channel, DeliveryMethod},
        error::MessageError,
        net_op::NetOp,
    },
    types::{AssetId, EntityId, HostType, Platform, Vec3},
};

/// What the server tells a freshly connected client about itself
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ServerInfo {
    pub app_name: String,
    /// Fingerprint of the server's `Protocol`; must match the client's
    pub protocol_fingerprint: u64,
    /// Out-of-band catalog download paths
    pub endpoints: Vec<String>,
}

/// A replicated state payload for one channel of one entity
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct EntityUpdate {
    pub entity_id: EntityId,
    pub channel: Channel,
    pub payload: Vec<u8>,
}

impl EntityUpdate {
    pub fn delivery_method(&self) -> DeliveryMethod {
        self.channel.delivery_method()
    }
}

/// A client asking the server to spawn a server-owned entity
#[derive(Clone, Debug, Default, PartialEq)]
pub struct InstantiateRequest {
    pub asset_id: AssetId,
    pub position: Option<Vec3>,
    pub rotation: Option<Vec3>,
    pub scale: Option<Vec3>,
}

#[derive(Clone, Debug, PartialEq)]
pub enum NetMessage {
    /// `SystemInfo`, server to client
    ServerInfo(ServerInfo),
    /// `SystemInfo`, client to server
    ClientInfo { platform: Platform },
    Ready,
    /// `StringsStart`, server to client: how many strings the catalog holds
    StringsStart { count: u32 },
    /// `StringsStart`, client to server: begin streaming the strings
    StringsRequest,
    StringsData { index: u32, name: String },
    /// `AssetsStart`, server to client: blob size for the client's platform
    AssetsStart { size: u32 },
    /// `AssetsStart`, client to server: begin streaming the blob
    AssetsRequest { platform: Platform },
    AssetsData { offset: u32, bytes: Vec<u8> },
    NewEntity {
        asset_id: AssetId,
        entity_id: EntityId,
        is_owner: bool,
    },
    EntityUpdate(EntityUpdate),
    DestroyEntity { entity_id: EntityId },
    InstantiateEntity(InstantiateRequest),
    ActionLocal(ActionCall),
    ActionGlobal(ActionCall),
    /// Targeted action from the server to one client
    Action(ActionCall),
}

impl NetMessage {
    pub fn net_op(&self) -> NetOp {
        match self {
            NetMessage::ServerInfo(_) | NetMessage::ClientInfo { .. } => NetOp::SystemInfo,
            NetMessage::Ready => NetOp::Ready,
            NetMessage::StringsStart { .. } | NetMessage::StringsRequest => NetOp::StringsStart,
            NetMessage::StringsData { .. } => NetOp::StringsData,
            NetMessage::AssetsStart { .. } | NetMessage::AssetsRequest { .. } => NetOp::AssetsStart,
            NetMessage::AssetsData { .. } => NetOp::AssetsData,
            NetMessage::NewEntity { .. } => NetOp::NewEntity,
            NetMessage::EntityUpdate(_) => NetOp::EntityUpdate,
            NetMessage::DestroyEntity { .. } => NetOp::DestroyEntity,
            NetMessage::InstantiateEntity(_) => NetOp::InstantiateEntity,
            NetMessage::ActionLocal(_) => NetOp::ActionLocal,
            NetMessage::ActionGlobal(_) => NetOp::ActionGlobal,
            NetMessage::Action(_) => NetOp::Action,
        }
    }

    /// Which host is allowed to send this message
    pub fn sender(&self) -> Option<HostType> {
        match self {
            NetMessage::ServerInfo(_)
            | NetMessage::StringsStart { .. }
            | NetMessage::StringsData { .. }
            | NetMessage::AssetsStart { .. }
            | NetMessage::AssetsData { .. }
            | NetMessage::NewEntity { .. }
            | NetMessage::Action(_) => Some(HostType::Server),
            NetMessage::ClientInfo { .. }
            | NetMessage::Ready
            | NetMessage::StringsRequest
            | NetMessage::AssetsRequest { .. }
            | NetMessage::InstantiateEntity(_)
            | NetMessage::ActionLocal(_)
            | NetMessage::ActionGlobal(_) => Some(HostType::Client),
            NetMessage::EntityUpdate(_) | NetMessage::DestroyEntity { .. } => None,
        }
    }

    pub fn delivery_method(&self) -> DeliveryMethod {
        match self {
            NetMessage::EntityUpdate(update) => update.delivery_method(),
            _ => DeliveryMethod::ReliableOrdered,
        }
    }

    pub fn write(&self, writer: &mut dyn ByteWrite) {
        self.net_op().to_byte().ser(writer);
        match self {
            NetMessage::ServerInfo(info) => {
                info.app_name.ser(writer);
                info.protocol_fingerprint.ser(writer);
                info.endpoints.ser(writer);
            }
            NetMessage::ClientInfo { platform } => platform.ser(writer),
            NetMessage::Ready | NetMessage::StringsRequest => {}
            NetMessage::StringsStart { count } => count.ser(writer),
            NetMessage::StringsData { index, name } => {
                index.ser(writer);
                name.ser(writer);
            }
            NetMessage::AssetsStart { size } => size.ser(writer),
            NetMessage::AssetsRequest { platform } => platform.ser(writer),
            NetMessage::AssetsData { offset, bytes } => {
                offset.ser(writer);
                (bytes.len() as u32).ser(writer);
                writer.write_bytes(bytes);
            }
            NetMessage::NewEntity {
                asset_id,
                entity_id,
                is_owner,
            } => {
                asset_id.ser(writer);
                entity_id.ser(writer);
                is_owner.ser(writer);
            }
            NetMessage::EntityUpdate(update) => {
                update.entity_id.ser(writer);
                update.channel.ser(writer);
                writer.write_bytes(&update.payload);
            }
            NetMessage::DestroyEntity { entity_id } => entity_id.ser(writer),
            NetMessage::InstantiateEntity(request) => {
                request.asset_id.ser(writer);
                // all three presence flags first, then the present vectors
                request.position.is_some().ser(writer);
                request.rotation.is_some().ser(writer);
                request.scale.is_some().ser(writer);
                for vector in [request.position, request.rotation, request.scale]
                    .iter()
                    .flatten()
                {
                    vector.ser(writer);
                }
            }
            NetMessage::ActionLocal(call)
            | NetMessage::ActionGlobal(call)
            | NetMessage::Action(call) => call.write(writer),
        }
    }

    pub fn to_bytes(&self) -> Vec<u8> {
        let mut writer = ByteWriter::new();
        self.write(&mut writer);
        writer.to_bytes()
    }

    /// Decodes one packet sent by a host of type `sender`
    pub fn read(bytes: &[u8], sender: HostType) -> Result<Self, MessageError> {
        let mut reader = ByteReader::new(bytes);
        let opcode = reader.read_byte().map_err(|_| MessageError::Empty)?;
        let op = NetOp::from_byte(opcode).ok_or(MessageError::UnknownOpcode { opcode })?;

        let message = Self::read_payload(op, sender, &mut reader)
            .map_err(|_| MessageError::Malformed { opcode: op })?;

        if let Some(expected) = message.sender() {
            if expected != sender {
                return Err(MessageError::WrongDirection { opcode: op, sender });
            }
        }
        if !reader.is_exhausted() {
            return Err(MessageError::TrailingBytes {
                opcode: op,
                count: reader.bytes_remaining(),
            });
        }

        Ok(message)
    }

    fn read_payload(
        op: NetOp,
        sender: HostType,
        reader: &mut ByteReader,
    ) -> Result<Self, SerdeErr> {
        let message = match (op, sender) {
            (NetOp::SystemInfo, HostType::Server) => NetMessage::ServerInfo(ServerInfo {
                app_name: String::de(reader)?,
                protocol_fingerprint: u64::de(reader)?,
                endpoints: Vec::<String>::de(reader)?,
            }),
            (NetOp::SystemInfo, HostType::Client) => NetMessage::ClientInfo {
                platform: Platform::de(reader)?,
            },
            (NetOp::Ready, _) => NetMessage::Ready,
            (NetOp::StringsStart, HostType::Server) => NetMessage::StringsStart {
                count: u32::de(reader)?,
            },
            (NetOp::StringsStart, HostType::Client) => NetMessage::StringsRequest,
            (NetOp::StringsData, _) => NetMessage::StringsData {
                index: u32::de(reader)?,
                name: String::de(reader)?,
            },
            (NetOp::AssetsStart, HostType::Server) => NetMessage::AssetsStart {
                size: u32::de(reader)?,
            },
            (NetOp::AssetsStart, HostType::Client) => NetMessage::AssetsRequest {
                platform: Platform::de(reader)?,
            },
            (NetOp::AssetsData, _) => {
                let offset = u32::de(reader)?;
                let length = u32::de(reader)?;
                let bytes = reader.read_bytes(length as usize)?.to_vec();
                NetMessage::AssetsData { offset, bytes }
            }
            (NetOp::NewEntity, _) => NetMessage::NewEntity {
                asset_id: AssetId::de(reader)?,
                entity_id: EntityId::de(reader)?,
                is_owner: bool::de(reader)?,
            },
            (NetOp::EntityUpdate, _) => NetMessage::EntityUpdate(EntityUpdate {
                entity_id: EntityId::de(reader)?,
                channel: Channel::de(reader)?,
                payload: reader.read_remaining().to_vec(),
            }),
            (NetOp::DestroyEntity, _) => NetMessage::DestroyEntity {
                entity_id: EntityId::de(reader)?,
            },
            (NetOp::InstantiateEntity, _) => {
                let asset_id = AssetId::de(reader)?;
                let has_position = bool::de(reader)?;
                let has_rotation = bool::de(reader)?;
                let has_scale = bool::de(reader)?;
                let mut read_if = |present: bool| -> Result<Option<Vec3>, SerdeErr> {
                    if present {
                        Ok(Some(Vec3::de(reader)?))
                    } else {
                        Ok(None)
                    }
                };
                let position = read_if(has_position)?;
                let rotation = read_if(has_rotation)?;
                let scale = read_if(has_scale)?;
                NetMessage::InstantiateEntity(InstantiateRequest {
                    asset_id,
                    position,
                    rotation,
                    scale,
                })
            }
            (NetOp::ActionLocal, _) => NetMessage::ActionLocal(ActionCall::read(reader)?),
            (NetOp::ActionGlobal, _) => NetMessage::ActionGlobal(ActionCall::read(reader)?),
            (NetOp::Action, _) => NetMessage::Action(ActionCall::read(reader)?),
        };
        Ok(message)
    }
}
