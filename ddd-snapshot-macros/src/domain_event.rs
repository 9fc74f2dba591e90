use crate::utils::prepend_missing_fields;
use proc_macro::TokenStream;
use quote::quote;
use std::collections::HashMap;
use syn::punctuated::Punctuated;
use syn::spanned::Spanned;
use syn::{
    Expr, Ident, Item, Lit, LitInt, LitStr, Result, Token, parse::Parse, parse::ParseStream,
    parse_macro_input,
};

/// #[event] 宏实现
/// - 仅支持具名字段变体：`Variant { .. }`
/// - 确保每个变体具备字段：`id: String`, `aggregate_version: usize`
/// - 生成 `::ddd_snapshot::domain_event::DomainEvent` 实现
pub(crate) fn expand(attr: TokenStream, item: TokenStream) -> TokenStream {
    let cfg = parse_macro_input!(attr as EventAttrConfig);
    let mut input = parse_macro_input!(item as Item);

    let enum_item = match &mut input {
        Item::Enum(e) => e,
        other => {
            return syn::Error::new(other.span(), "#[event] can only be used on enum types")
                .to_compile_error()
                .into();
        }
    };

    let default_version = cfg
        .version
        .unwrap_or_else(|| LitInt::new("1", proc_macro2::Span::call_site()));

    let mut variant_types: HashMap<String, LitStr> = HashMap::new();
    let mut variant_versions: HashMap<String, LitInt> = HashMap::new();

    for v in &mut enum_item.variants {
        let variant_span = v.span();
        let syn::Fields::Named(fields_named) = &mut v.fields else {
            return syn::Error::new(
                variant_span,
                "#[event] supports only named-field enum variants, e.g., Variant { x: T }",
            )
            .to_compile_error()
            .into();
        };

        prepend_missing_fields(
            fields_named,
            &[
                ("id", syn::parse_quote! { String }),
                ("aggregate_version", syn::parse_quote! { usize }),
            ],
        );

        let (overrides, retained): (Vec<_>, Vec<_>) = std::mem::take(&mut v.attrs)
            .into_iter()
            .partition(|attr| attr.path().is_ident("event"));
        v.attrs = retained;

        let key = v.ident.to_string();
        for attr in &overrides {
            let parsed = match attr.parse_args::<VariantOverride>() {
                Ok(parsed) => parsed,
                Err(err) => return err.to_compile_error().into(),
            };
            if let Some(lit) = parsed.event_type {
                if variant_types.insert(key.clone(), lit).is_some() {
                    return syn::Error::new(
                        attr.span(),
                        "duplicate 'event_type' specified for this variant",
                    )
                    .to_compile_error()
                    .into();
                }
            }
            if let Some(lit) = parsed.event_version {
                if variant_versions.insert(key.clone(), lit).is_some() {
                    return syn::Error::new(
                        attr.span(),
                        "duplicate 'event_version' specified for this variant",
                    )
                    .to_compile_error()
                    .into();
                }
            }
        }
    }

    let enum_ident = &enum_item.ident;
    let enum_name = enum_ident.to_string();

    let type_match_arms = enum_item.variants.iter().map(|v| {
        let v_ident = &v.ident;
        let lit = variant_types
            .get(&v_ident.to_string())
            .cloned()
            .unwrap_or_else(|| LitStr::new(&format!("{enum_name}.{v_ident}"), v_ident.span()));
        quote! { Self::#v_ident { .. } => #lit }
    });

    let id_match_arms = enum_item.variants.iter().map(|v| {
        let v_ident = &v.ident;
        quote! { Self::#v_ident { id, .. } => id.as_str() }
    });

    let ver_match_arms = enum_item.variants.iter().map(|v| {
        let v_ident = &v.ident;
        let lit = variant_versions
            .get(&v_ident.to_string())
            .unwrap_or(&default_version);
        quote! { Self::#v_ident { .. } => #lit }
    });

    let agg_ver_match_arms = enum_item.variants.iter().map(|v| {
        let v_ident = &v.ident;
        quote! { Self::#v_ident { aggregate_version, .. } => *aggregate_version }
    });

    let (impl_generics, ty_generics, where_clause) = enum_item.generics.split_for_impl();

    let out = quote! {
        #enum_item

        impl #impl_generics ::ddd_snapshot::domain_event::DomainEvent for #enum_ident #ty_generics #where_clause {
            fn event_id(&self) -> &str { match self { #( #id_match_arms, )* } }
            fn event_type(&self) -> &str { match self { #( #type_match_arms, )* } }
            fn event_version(&self) -> usize { match self { #( #ver_match_arms, )* } }
            fn aggregate_version(&self) -> usize { match self { #( #agg_ver_match_arms, )* } }
        }
    };

    TokenStream::from(out)
}

// -------- parsing --------

// 枚举级配置：version = <int>
struct EventAttrConfig {
    version: Option<LitInt>,
}

impl Parse for EventAttrConfig {
    fn parse(input: ParseStream) -> Result<Self> {
        let mut version = None;

        for kv in Punctuated::<AttrKv, Token![,]>::parse_terminated(input)? {
            match kv.key.to_string().as_str() {
                "version" if version.is_none() => version = Some(kv.int_lit()?),
                "version" => {
                    return Err(syn::Error::new(
                        kv.key.span(),
                        "duplicate key 'version' in attribute",
                    ));
                }
                _ => {
                    return Err(syn::Error::new(
                        kv.key.span(),
                        "unknown key; expected 'version'",
                    ));
                }
            }
        }

        Ok(Self { version })
    }
}

// 变体级覆写：event_type = "...", event_version = <int>
struct VariantOverride {
    event_type: Option<LitStr>,
    event_version: Option<LitInt>,
}

impl Parse for VariantOverride {
    fn parse(input: ParseStream) -> Result<Self> {
        let mut event_type = None;
        let mut event_version = None;

        for kv in Punctuated::<AttrKv, Token![,]>::parse_terminated(input)? {
            match kv.key.to_string().as_str() {
                "event_type" if event_type.is_none() => event_type = Some(kv.str_lit()?),
                "event_version" if event_version.is_none() => {
                    event_version = Some(kv.int_lit()?)
                }
                "event_type" | "event_version" => {
                    return Err(syn::Error::new(
                        kv.key.span(),
                        format!("duplicate key '{}' in attribute", kv.key),
                    ));
                }
                _ => {
                    return Err(syn::Error::new(
                        kv.key.span(),
                        "unknown key; expected 'event_type' | 'event_version'",
                    ));
                }
            }
        }

        Ok(Self {
            event_type,
            event_version,
        })
    }
}

struct AttrKv {
    key: Ident,
    value: Expr,
}

impl AttrKv {
    fn str_lit(self) -> Result<LitStr> {
        match self.value {
            Expr::Lit(syn::ExprLit {
                lit: Lit::Str(lit), ..
            }) => Ok(lit),
            other => Err(syn::Error::new(
                other.span(),
                format!("expected string literal for '{}'", self.key),
            )),
        }
    }

    fn int_lit(self) -> Result<LitInt> {
        match self.value {
            Expr::Lit(syn::ExprLit {
                lit: Lit::Int(lit), ..
            }) => Ok(lit),
            other => Err(syn::Error::new(
                other.span(),
                format!("expected integer literal for '{}'", self.key),
            )),
        }
    }
}

impl Parse for AttrKv {
    fn parse(input: ParseStream) -> Result<Self> {
        let key = input.parse()?;
        let _eq: Token![=] = input.parse()?;
        let value = input.parse()?;
        Ok(Self { key, value })
    }
}
