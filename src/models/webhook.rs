use serde::Deserialize;
use serde_json::Value;

/// Event envelope posted by the voice platform.
#[derive(Debug, Default, Deserialize)]
pub struct WebhookEnvelope {
    #[serde(default)]
    pub message: Option<WebhookMessage>,
    #[serde(default)]
    pub call: Option<CallInfo>,
}

impl WebhookEnvelope {
    /// Top-level `call`, falling back to the copy some events nest in `message.call`.
    pub fn call(&self) -> Option<&CallInfo> {
        self.call
            .as_ref()
            .or_else(|| self.message.as_ref().and_then(|m| m.call.as_ref()))
    }

    pub fn destination_phone(&self) -> Option<&str> {
        self.call().and_then(CallInfo::destination_phone)
    }
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WebhookMessage {
    #[serde(rename = "type", default)]
    pub kind: Option<String>,
    #[serde(default)]
    pub tool_calls: Option<Vec<ToolCall>>,
    #[serde(default)]
    pub tool_call_list: Option<Vec<ToolCall>>,
    #[serde(default)]
    pub function_call: Option<FunctionCallPayload>,
    #[serde(default)]
    pub call: Option<CallInfo>,
}

impl WebhookMessage {
    pub fn tool_calls(&self) -> &[ToolCall] {
        match (&self.tool_calls, &self.tool_call_list) {
            (Some(calls), _) if !calls.is_empty() => calls,
            (_, Some(calls)) => calls,
            _ => &[],
        }
    }

    pub fn is_greeting(&self) -> bool {
        matches!(self.kind.as_deref(), Some("transcript") | Some("greeting"))
    }
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CallInfo {
    #[serde(default)]
    pub id: Option<String>,
    #[serde(default)]
    pub assistant_phone_number: Option<String>,
    #[serde(default)]
    pub phone_number: Option<PhoneNumberInfo>,
}

impl CallInfo {
    pub fn destination_phone(&self) -> Option<&str> {
        self.assistant_phone_number
            .as_deref()
            .or_else(|| self.phone_number.as_ref().and_then(|p| p.number.as_deref()))
            .filter(|p| !p.trim().is_empty())
    }
}

#[derive(Debug, Default, Deserialize)]
pub struct PhoneNumberInfo {
    #[serde(default)]
    pub number: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct ToolCall {
    #[serde(default)]
    pub id: Option<String>,
    pub function: FunctionInvocation,
}

#[derive(Debug, Deserialize)]
pub struct FunctionInvocation {
    pub name: String,
    #[serde(default)]
    pub arguments: Value,
}

/// Legacy single-function shape (`message.functionCall`).
#[derive(Debug, Deserialize)]
pub struct FunctionCallPayload {
    pub name: String,
    #[serde(default)]
    pub parameters: Value,
}
