//! Prompts sent to generation backends

use crate::types::RouteInfo;

/// Fixed instructions for the structured analysis call
pub const ANALYSIS_SYSTEM_PROMPT: &str = r#"You are an expert FastAPI code analyzer. Analyze the code and provide comprehensive documentation.
Focus on:
1. Clear, detailed descriptions for each endpoint
2. Accurate parameter documentation
3. Logical grouping with tags
4. Only routes that are actually declared in the code

For every route, set "confidence_score" to a number between 0.0 and 1.0 expressing how certain you are that the route really exists in the code.

Return ONLY the documentation in this JSON format, with no explanation:
{
    "title": "API name",
    "description": "Overall API description",
    "version": "1.0.0",
    "routes": [
        {
            "path": "/path/{id}",
            "methods": ["GET"],
            "summary": "Clear summary",
            "description": "Detailed description of functionality",
            "parameters": [
                {
                    "name": "id",
                    "type": "path|query|body|header|cookie",
                    "required": true,
                    "description": "Clear parameter description",
                    "data_type": "integer"
                }
            ],
            "tags": ["logical_group"],
            "deprecated": false,
            "confidence_score": 0.9
        }
    ]
}"#;

/// User prompt asking for a longer description of one route
pub fn description_prompt(route: &RouteInfo) -> String {
    format!(
        "Generate a detailed description for this API endpoint:\nPath: {}\nMethods: {}",
        route.path,
        route.methods.join(", ")
    )
}
