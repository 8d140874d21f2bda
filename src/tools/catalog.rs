// Built-in tool table

use anyhow::Result;

use super::registry::{ParamSpec, ParamType, ToolRegistry, ToolSpec};
use crate::collaborators::{Collaborators, mutation::CREATE_FIELDS};

/// Register the agent's tools against their collaborators.
///
/// Precedence decides which tool a clause belongs to when its words match
/// several: mutations beat cards, cards beat charts, charts beat lookups.
pub fn builtin_registry(collaborators: &Collaborators) -> Result<ToolRegistry> {
    let mut create_property = ToolSpec::new(
        "create_property",
        "created",
        "Register a new property with its address, purchase and rent details",
        collaborators.create_property.clone(),
    )
    .keywords(&[
        "new property",
        "create property",
        "create a property",
        "add property",
        "add a property",
        "register property",
        "register a property",
    ])
    .precedence(4);
    for (name, ty) in CREATE_FIELDS {
        create_property = create_property.param(ParamSpec::required(name, ty));
    }

    ToolRegistry::new()
        .register(
            ToolSpec::new(
                "get_properties",
                "properties",
                "Fetch property records matching a natural-language question",
                collaborators.properties.clone(),
            )
            .param(ParamSpec::required("query", ParamType::String))
            .param(ParamSpec::optional("area", ParamType::String))
            .param(ParamSpec::optional("limit", ParamType::Integer))
            .keywords(&[
                "properties", "property", "listings", "listing", "list", "show", "find", "search",
                "fetch", "get",
            ]),
        )?
        .register(
            ToolSpec::new(
                "get_chart",
                "chart",
                "Fetch matching property records and render a chart from them",
                collaborators.chart.clone(),
            )
            .param(ParamSpec::required("query", ParamType::String))
            .param(ParamSpec::optional("area", ParamType::String))
            .keywords(&[
                "chart",
                "charts",
                "graph",
                "plot",
                "trend",
                "visualize",
                "visualise",
                "visualization",
                "visualisation",
            ])
            .precedence(1),
        )?
        .register(
            ToolSpec::new(
                "create_trello_card",
                "card",
                "Create a Trello card on the configured list",
                collaborators.cards.clone(),
            )
            .param(ParamSpec::required("name", ParamType::String))
            .param(ParamSpec::optional("desc", ParamType::String))
            .keywords(&["card", "trello", "ticket"])
            .precedence(2),
        )?
        .register(
            ToolSpec::new(
                "update_property_price",
                "updates",
                "Update the rent price of a property by its ID",
                collaborators.update_price.clone(),
            )
            .param(ParamSpec::required("id", ParamType::Integer))
            .param(ParamSpec::required("rent_price", ParamType::Float))
            .param(ParamSpec::optional("reason", ParamType::String))
            .keywords(&[
                "update",
                "change rent",
                "change the rent",
                "set rent",
                "set the rent",
                "increase",
                "decrease",
                "reduce",
                "raise",
                "lower",
                "adjust",
            ])
            .precedence(3),
        )?
        .register(create_property)
}
