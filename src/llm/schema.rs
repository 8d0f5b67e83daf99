//! JSON schemas describing each response shape requested from the model.

/// Schema for a single commit message with dependency changes.
pub const COMMIT_MESSAGE_SCHEMA: &str = r##"{
  "type": "object",
  "properties": {
    "headline": {"type": "string"},
    "description": {"type": "string"},
    "dependencies": {
      "type": "object",
      "properties": {
        "added": {"type": "array", "items": {"$ref": "#/$defs/Dependency"}},
        "upgraded": {"type": "array", "items": {"$ref": "#/$defs/Dependency"}},
        "downgraded": {"type": "array", "items": {"$ref": "#/$defs/Dependency"}},
        "removed": {"type": "array", "items": {"$ref": "#/$defs/Dependency"}}
      },
      "required": ["added", "upgraded", "downgraded", "removed"],
      "additionalProperties": false
    }
  },
  "required": ["headline", "description", "dependencies"],
  "additionalProperties": false,
  "$defs": {
    "Dependency": {
      "type": "object",
      "properties": {
        "version": {"type": "string"},
        "name": {"type": "string"}
      },
      "required": ["version", "name"],
      "additionalProperties": false
    }
  }
}"##;

/// Schema for a patch-splitting decision.
pub const PATCH_SCHEMA: &str = r##"{
  "type": "object",
  "properties": {
    "included-hunks": {"type": "array", "items": {"type": "string", "enum": ["y", "n"]}},
    "reason": {"type": "string"},
    "commitMessage": {"$ref": "#/$defs/CommitMessage"},
    "morePatchesRemaining": {"type": "boolean"},
    "containsFaults": {"type": "boolean"}
  },
  "required": ["included-hunks", "reason", "commitMessage", "morePatchesRemaining", "containsFaults"],
  "additionalProperties": false,
  "$defs": {
    "Dependency": {
      "type": "object",
      "properties": {
        "version": {"type": "string"},
        "name": {"type": "string"}
      },
      "required": ["version", "name"],
      "additionalProperties": false
    },
    "CommitMessage": {
      "type": "object",
      "properties": {
        "headline": {"type": "string"},
        "description": {"type": "string"},
        "dependencies": {
          "type": "object",
          "properties": {
            "added": {"type": "array", "items": {"$ref": "#/$defs/Dependency"}},
            "upgraded": {"type": "array", "items": {"$ref": "#/$defs/Dependency"}},
            "downgraded": {"type": "array", "items": {"$ref": "#/$defs/Dependency"}},
            "removed": {"type": "array", "items": {"$ref": "#/$defs/Dependency"}}
          },
          "required": ["added", "upgraded", "downgraded", "removed"],
          "additionalProperties": false
        }
      },
      "required": ["headline", "description", "dependencies"],
      "additionalProperties": false
    }
  }
}"##;
