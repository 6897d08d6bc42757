// SPDX-License-Identifier: GPL-3.0-or-later
// Copyright (C) 2026 Mark Wells <contact@markwells.dev>

//! Fixed React and React Native snippets offered on every completion.

use lsp_types::{CompletionItem, CompletionItemKind, Documentation, InsertTextFormat};

struct Snippet {
    label: &'static str,
    documentation: &'static str,
    body: &'static str,
    kind: CompletionItemKind,
    /// Body contains tab stops.
    placeholders: bool,
    sort: &'static str,
}

const SNIPPETS: &[Snippet] = &[
    // React Native components
    Snippet {
        label: "rnf",
        documentation: "React Native Function Component\nImports: View, Text from react-native",
        body: r"import { View, Text } from 'react-native';

const ${1:ComponentName} = () => {
  return (
    <View>
      <Text>${2:Hello World}</Text>
    </View>
  );
};",
        kind: CompletionItemKind::SNIPPET,
        placeholders: true,
        sort: "1000",
    },
    Snippet {
        label: "rnfe",
        documentation: "React Native Function Component (Exported)\nImports: View, Text from react-native",
        body: r"import { View, Text } from 'react-native';

export const ${1:ComponentName} = () => {
  return (
    <View>
      <Text>${2:Hello World}</Text>
    </View>
  );
};",
        kind: CompletionItemKind::SNIPPET,
        placeholders: true,
        sort: "1001",
    },
    Snippet {
        label: "rnfs",
        documentation: "React Native Function Component with StyleSheet",
        body: r"import { View, Text, StyleSheet } from 'react-native';

const ${1:ComponentName} = () => {
  return (
    <View style={styles.container}>
      <Text>${2:Hello World}</Text>
    </View>
  );
};

const styles = StyleSheet.create({
  container: {
    flex: 1,
    justifyContent: 'center',
    alignItems: 'center',
  },
});",
        kind: CompletionItemKind::SNIPPET,
        placeholders: true,
        sort: "1002",
    },
    // React components
    Snippet {
        label: "rf",
        documentation: "React Function Component (default)",
        body: r"const ${1:ComponentName} = () => {
  return (
    <div>
      ${2:Hello World}
    </div>
  );
};",
        kind: CompletionItemKind::SNIPPET,
        placeholders: true,
        sort: "1003",
    },
    Snippet {
        label: "rfe",
        documentation: "React Function Component (Exported)",
        body: r"export const ${1:ComponentName} = () => {
  return (
    <div>
      ${2:Hello World}
    </div>
  );
};",
        kind: CompletionItemKind::SNIPPET,
        placeholders: true,
        sort: "1004",
    },
    Snippet {
        label: "rfc",
        documentation: "React Function Component (Named)",
        body: r"function ${1:ComponentName}() {
  return (
    <div>
      ${2:Hello World}
    </div>
  );
}

export default ${1:ComponentName};",
        kind: CompletionItemKind::SNIPPET,
        placeholders: true,
        sort: "1005",
    },
    // Hooks
    Snippet {
        label: "useState",
        documentation: "React useState hook",
        body: r"const [${1:state}, set${1/(.*)/${1:/capitalize}/}] = useState(${2:null});",
        kind: CompletionItemKind::FUNCTION,
        placeholders: true,
        sort: "1006",
    },
    Snippet {
        label: "useEffect",
        documentation: "React useEffect hook",
        body: r"useEffect(() => {
  ${1:// effect}
  return () => {
    ${2:// cleanup}
  };
}, [${3:dependencies}]);",
        kind: CompletionItemKind::FUNCTION,
        placeholders: true,
        sort: "1007",
    },
    // Bare React Native names
    Snippet {
        label: "View",
        documentation: "React Native View component\nImport: { View } from \"react-native\"",
        body: "<View></View>",
        kind: CompletionItemKind::CLASS,
        placeholders: false,
        sort: "1008",
    },
    Snippet {
        label: "Text",
        documentation: "React Native Text component\nImport: { Text } from \"react-native\"",
        body: "<Text></Text>",
        kind: CompletionItemKind::CLASS,
        placeholders: false,
        sort: "1009",
    },
    Snippet {
        label: "StyleSheet",
        documentation: "React Native StyleSheet\nImport: { StyleSheet } from \"react-native\"",
        body: "StyleSheet",
        kind: CompletionItemKind::CLASS,
        placeholders: false,
        sort: "1010",
    },
    // Return statements
    Snippet {
        label: "rnr",
        documentation: "React Native Return Statement",
        body: r"return (
  <View>
    ${1:content}
  </View>
);",
        kind: CompletionItemKind::SNIPPET,
        placeholders: true,
        sort: "0010",
    },
    Snippet {
        label: "rr",
        documentation: "React Return Statement",
        body: r"return (
  <div>
    ${1:content}
  </div>
);",
        kind: CompletionItemKind::SNIPPET,
        placeholders: true,
        sort: "00011",
    },
    // More hooks
    Snippet {
        label: "useCallback",
        documentation: "React useCallback hook",
        body: r"const ${1:callback} = useCallback(() => {
  ${2}
}, [${3}]);",
        kind: CompletionItemKind::FUNCTION,
        placeholders: true,
        sort: "1011",
    },
    Snippet {
        label: "useMemo",
        documentation: "React useMemo hook",
        body: r"const ${1:memorizedValue} = useMemo(() => ${2:value}, [${3:dependencies}]);",
        kind: CompletionItemKind::FUNCTION,
        placeholders: true,
        sort: "1012",
    },
    Snippet {
        label: "useCustomHook",
        documentation: "Custom React hook boilerplate",
        body: r"const use${1:CustomHook} = () => {
  const [${2:state}, set${2/(.*)/${1:/capitalize}/}] = useState(${3:null});

  return {
    ${2},
  };
};",
        kind: CompletionItemKind::SNIPPET,
        placeholders: true,
        sort: "1013",
    },
    Snippet {
        label: "useCustomHookExport",
        documentation: "Custom React hook boilerplate (exported)",
        body: r"export const use${1:CustomHook} = () => {
  const [${2:state}, set${2/(.*)/${1:/capitalize}/}] = useState(${3:null});

  return {
    ${2},
  };
};",
        kind: CompletionItemKind::SNIPPET,
        placeholders: true,
        sort: "1013",
    },
    // Navigation
    Snippet {
        label: "rnnav",
        documentation: "React Navigation screen setup",
        body: r#"import { createNativeStackNavigator } from '@react-navigation/native-stack';

const Stack = createNativeStackNavigator();

const ${1:AppNavigator} = () => {
  return (
    <Stack.Navigator>
      <Stack.Screen name="${2:Home}" component={${3:HomeScreen}} />
    </Stack.Navigator>
  );
};"#,
        kind: CompletionItemKind::SNIPPET,
        placeholders: true,
        sort: "1014",
    },
    // Styles
    Snippet {
        label: "styleObj",
        documentation: "Inline Style object",
        body: r"{
  padding: ${1:10},
  backgroundColor: '${2:#fff}',
  borderRadius: ${3:8},
}",
        kind: CompletionItemKind::SNIPPET,
        placeholders: true,
        sort: "1015",
    },
];

/// Every catalog entry as a completion item, in catalog order.
#[must_use]
pub fn items() -> Vec<CompletionItem> {
    SNIPPETS.iter().map(Snippet::to_item).collect()
}

impl Snippet {
    fn to_item(&self) -> CompletionItem {
        CompletionItem {
            label: self.label.to_string(),
            kind: Some(self.kind),
            documentation: Some(Documentation::String(self.documentation.to_string())),
            insert_text: Some(self.body.to_string()),
            insert_text_format: self.placeholders.then_some(InsertTextFormat::SNIPPET),
            sort_text: Some(self.sort.to_string()),
            ..CompletionItem::default()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn test_catalog_labels() {
        let labels: Vec<String> = items().into_iter().map(|i| i.label).collect();
        assert_eq!(labels.len(), 19);
        assert_eq!(labels.first().map(String::as_str), Some("rnf"));
        assert_eq!(labels.last().map(String::as_str), Some("styleObj"));

        let unique: HashSet<&String> = labels.iter().collect();
        assert_eq!(unique.len(), labels.len(), "labels must be unique");
    }

    #[test]
    fn test_plain_entries_are_not_snippets() {
        for item in items() {
            let has_tab_stop = item.insert_text.as_deref().is_some_and(|t| t.contains("${"));
            assert_eq!(
                item.insert_text_format == Some(InsertTextFormat::SNIPPET),
                has_tab_stop,
                "{} format does not match its body",
                item.label
            );
        }
    }

    #[test]
    fn test_hooks_are_functions() {
        let items = items();
        let use_state = items.iter().find(|i| i.label == "useState");
        assert_eq!(
            use_state.and_then(|i| i.kind),
            Some(CompletionItemKind::FUNCTION)
        );
    }
}
