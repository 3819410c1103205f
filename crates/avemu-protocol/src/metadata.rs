//! Flatten a definition into the console's read-only metadata.

use avemu_core::{ArgInfo, CommandInfo, ProtocolMetadata};

use crate::{
    schema::{CommandDef, ProtocolDefinition},
    template::Template,
};

/// Build the metadata snapshot for `definition`, loaded as `id`.
///
/// Commands come out sorted by name; arguments in the order their
/// placeholders appear in the command syntax, followed by any declared
/// argument the syntax does not mention.
pub fn extract_metadata(id: &str, definition: &ProtocolDefinition) -> ProtocolMetadata {
    ProtocolMetadata {
        id: id.to_string(),
        device_name: definition.device_name(),
        default_port: definition.default_port(),
        eol: definition.protocol.eol.clone(),
        commands: definition.commands.iter().map(|(name, def)| command_info(name, def)).collect(),
    }
}

fn command_info(name: &str, def: &CommandDef) -> CommandInfo {
    let mut order: Vec<String> = Template::parse(&def.command)
        .map(|t| t.placeholders().filter(|p| def.args.contains_key(*p)).map(String::from).collect())
        .unwrap_or_default();
    for declared in def.args.keys() {
        if !order.contains(declared) {
            order.push(declared.clone());
        }
    }

    let args = order
        .into_iter()
        .filter_map(|name| {
            let arg = def.args.get(&name)?;
            Some(ArgInfo {
                name,
                kind: arg.kind.to_string(),
                min: arg.min,
                max: arg.max,
                default: arg.default.as_ref().map(ToString::to_string),
            })
        })
        .collect();

    let response = def.response.clone().unwrap_or_default();

    CommandInfo {
        name: name.to_string(),
        description: def.description.clone(),
        category: def.category.clone(),
        syntax: def.command.clone(),
        args,
        state_changes: def.state_change.iter().map(|(k, v)| (k.clone(), v.clone())).collect(),
        response_pattern: response.pattern.unwrap_or_default(),
        response_template: response.template.unwrap_or_default(),
    }
}
