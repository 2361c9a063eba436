/// Available commands and autocomplete logic

#[derive(Debug, Clone)]
pub struct Command {
  pub name: &'static str,
  pub aliases: &'static [&'static str],
  pub description: &'static str,
}

/// All available commands
pub const COMMANDS: &[Command] = &[
  Command {
    name: "more",
    aliases: &["m", "next"],
    description: "Fetch the next page",
  },
  Command {
    name: "refetch",
    aliases: &["r", "reload"],
    description: "Reset the cache and fetch from the start",
  },
  Command {
    name: "reset",
    aliases: &["clear"],
    description: "Drop all cached data",
  },
  Command {
    name: "quit",
    aliases: &["q", "exit"],
    description: "Exit gqb",
  },
];

/// Get autocomplete suggestions for a given input
pub fn get_suggestions(input: &str) -> Vec<&'static Command> {
  let input_lower = input.trim().to_lowercase();

  if input_lower.is_empty() {
    return COMMANDS.iter().collect();
  }

  let mut matches: Vec<(&Command, u32)> = Vec::new();

  for cmd in COMMANDS {
    // Exact match on name
    if cmd.name == input_lower {
      matches.push((cmd, 0)); // Highest priority
      continue;
    }

    // Exact match on alias
    if cmd.aliases.contains(&input_lower.as_str()) {
      matches.push((cmd, 1));
      continue;
    }

    // Prefix match on name
    if cmd.name.starts_with(&input_lower) {
      matches.push((cmd, 2));
      continue;
    }

    // Prefix match on alias
    if cmd.aliases.iter().any(|a| a.starts_with(&input_lower)) {
      matches.push((cmd, 3));
    }
  }

  // Sort by priority
  matches.sort_by_key(|(_, priority)| *priority);

  matches.into_iter().map(|(cmd, _)| cmd).collect()
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn test_empty_input_returns_all() {
    let suggestions = get_suggestions("");
    assert_eq!(suggestions.len(), COMMANDS.len());
  }

  #[test]
  fn test_exact_match() {
    let suggestions = get_suggestions("more");
    assert!(!suggestions.is_empty());
    assert_eq!(suggestions[0].name, "more");
  }

  #[test]
  fn test_alias_match() {
    let suggestions = get_suggestions("r");
    assert!(!suggestions.is_empty());
    assert_eq!(suggestions[0].name, "refetch");
  }

  #[test]
  fn test_prefix_match() {
    let suggestions = get_suggestions("ref");
    assert!(!suggestions.is_empty());
    assert_eq!(suggestions[0].name, "refetch");
  }

  #[test]
  fn test_reset_does_not_shadow_refetch_alias() {
    // "re" is a prefix of both; refetch comes first by table order
    let suggestions = get_suggestions("re");
    assert_eq!(suggestions[0].name, "refetch");
    assert!(suggestions.iter().any(|c| c.name == "reset"));
  }

  #[test]
  fn test_unknown_input_matches_nothing() {
    assert!(get_suggestions("zzz").is_empty());
  }
}
