use crate::error::GatewayError;
use ir::{IRRequest, IRResponse};
use protocol::{EncodeOptions, ProtocolTag};
use routing::ProviderProtocol;
use serde_json::Value;

fn conv_err(err: impl std::fmt::Display) -> GatewayError {
    GatewayError::ConversionError(err.to_string())
}

pub fn client_tag_for(path: &str) -> Option<ProtocolTag> {
    match path {
        "/v1/chat/completions" => Some(ProtocolTag::OpenAiChat),
        "/v1/responses" => Some(ProtocolTag::OpenAiResponses),
        "/v1/messages" => Some(ProtocolTag::Anthropic),
        _ => None,
    }
}

pub fn decode_client_request(tag: ProtocolTag, body: Value) -> Result<IRRequest, GatewayError> {
    match tag {
        ProtocolTag::OpenAiChat => {
            let req = serde_json::from_value(body).map_err(conv_err)?;
            protocol::openai_chat::decode_request(req).map_err(conv_err)
        }
        ProtocolTag::OpenAiResponses => {
            let req = serde_json::from_value(body).map_err(conv_err)?;
            protocol::openai_responses::decode_request(req).map_err(conv_err)
        }
        ProtocolTag::Anthropic => {
            let req = serde_json::from_value(body).map_err(conv_err)?;
            protocol::anthropic::decode_request(req).map_err(conv_err)
        }
    }
}

pub fn encode_client_response(tag: ProtocolTag, resp: &IRResponse) -> Result<Value, GatewayError> {
    let value = match tag {
        ProtocolTag::OpenAiChat => serde_json::to_value(protocol::openai_chat::encode_response(resp)),
        ProtocolTag::OpenAiResponses => serde_json::to_value(protocol::openai_responses::encode_response(resp)),
        ProtocolTag::Anthropic => serde_json::to_value(protocol::anthropic::encode_response(resp)),
    };
    value.map_err(conv_err)
}

/// Encodes the IR request for the candidate's upstream protocol, substituting
/// `target_model` for the client-requested logical model name — the whole
/// point of routing is that the upstream never sees the logical name.
pub fn encode_upstream_request(protocol: ProviderProtocol, req: &IRRequest, source: ProtocolTag, target_model: &str) -> Result<Value, GatewayError> {
    let req = if req.model == target_model {
        std::borrow::Cow::Borrowed(req)
    } else {
        let mut req = req.clone();
        req.model = target_model.to_string();
        std::borrow::Cow::Owned(req)
    };
    let value = match protocol {
        ProviderProtocol::OpenAi => serde_json::to_value(protocol::openai_chat::encode_request(&req).map_err(conv_err)?),
        ProviderProtocol::Anthropic => {
            serde_json::to_value(protocol::anthropic::encode_request(&req, &EncodeOptions { source }).map_err(conv_err)?)
        }
        ProviderProtocol::Gemini => return Err(GatewayError::ConversionError("gemini upstream is not supported".into())),
    };
    value.map_err(conv_err)
}

pub fn decode_upstream_response(protocol: ProviderProtocol, body: Value) -> Result<IRResponse, GatewayError> {
    match protocol {
        ProviderProtocol::OpenAi => {
            let resp = serde_json::from_value(body).map_err(conv_err)?;
            Ok(protocol::openai_chat::decode_response(resp))
        }
        ProviderProtocol::Anthropic => {
            let resp = serde_json::from_value(body).map_err(conv_err)?;
            Ok(protocol::anthropic::decode_response(resp))
        }
        ProviderProtocol::Gemini => Err(GatewayError::ConversionError("gemini upstream is not supported".into())),
    }
}

pub fn upstream_path(protocol: ProviderProtocol) -> &'static str {
    match protocol {
        ProviderProtocol::OpenAi => "/v1/chat/completions",
        ProviderProtocol::Anthropic => "/v1/messages",
        ProviderProtocol::Gemini => "/v1beta/models",
    }
}
