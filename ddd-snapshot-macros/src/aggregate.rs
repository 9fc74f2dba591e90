use crate::utils::{hoist_fields, is_field};
use proc_macro::TokenStream;
use quote::quote;
use syn::punctuated::Punctuated;
use syn::spanned::Spanned;
use syn::{Item, Result, Token, Type, parse::Parse, parse::ParseStream, parse_macro_input};

const STATE_FIELDS: [&str; 3] = ["id", "version", "snapshot_version"];

/// #[aggregate] 宏实现
/// - 确保 `id/version/snapshot_version` 位于字段最前
/// - 生成 `::ddd_snapshot::entity::Entity` 实现
pub(crate) fn expand(attr: TokenStream, item: TokenStream) -> TokenStream {
    let cfg = parse_macro_input!(attr as AggregateAttrConfig);
    let input = parse_macro_input!(item as Item);

    let mut st = match input {
        Item::Struct(s) => s,
        other => {
            return syn::Error::new(other.span(), "#[aggregate] only on struct")
                .to_compile_error()
                .into();
        }
    };

    let fields_named = match &mut st.fields {
        syn::Fields::Named(f) => f,
        _ => {
            return syn::Error::new(st.span(), "#[aggregate] only supports named-field struct")
                .to_compile_error()
                .into();
        }
    };

    let id_type = cfg.id_ty.unwrap_or_else(|| syn::parse_quote! { String });
    hoist_fields(
        fields_named,
        &[
            ("id", id_type.clone()),
            ("version", syn::parse_quote! { usize }),
            ("snapshot_version", syn::parse_quote! { ::std::option::Option<usize> }),
        ],
    );

    // 领域字段在空聚合中取默认值
    let domain_fields: Vec<_> = fields_named
        .named
        .iter()
        .filter(|f| !STATE_FIELDS.iter().any(|name| is_field(f, name)))
        .filter_map(|f| f.ident.clone())
        .collect();

    let ident = &st.ident;
    let (impl_generics, ty_generics, where_clause) = st.generics.split_for_impl();

    let expanded = quote! {
        #st

        impl #impl_generics ::ddd_snapshot::entity::Entity for #ident #ty_generics #where_clause {
            type Id = #id_type;

            fn new(aggregate_id: Self::Id) -> Self {
                Self {
                    id: aggregate_id,
                    version: 0,
                    snapshot_version: ::std::option::Option::None,
                    #( #domain_fields: ::std::default::Default::default(), )*
                }
            }

            fn id(&self) -> &Self::Id { &self.id }

            fn version(&self) -> usize { self.version }

            fn snapshot_version(&self) -> ::std::option::Option<usize> { self.snapshot_version }

            fn set_version(&mut self, version: usize) { self.version = version; }

            fn set_snapshot_version(&mut self, snapshot_version: ::std::option::Option<usize>) {
                self.snapshot_version = snapshot_version;
            }
        }
    };

    TokenStream::from(expanded)
}

// -------- parsing --------

struct AggregateAttrConfig {
    id_ty: Option<Type>,
}

impl Parse for AggregateAttrConfig {
    fn parse(input: ParseStream) -> Result<Self> {
        let mut id_ty: Option<Type> = None;

        let pairs = Punctuated::<KvType, Token![,]>::parse_terminated(input)?;
        for kv in pairs {
            if kv.key != "id" {
                return Err(syn::Error::new(
                    kv.key.span(),
                    "unknown key in attribute; expected 'id'",
                ));
            }
            if id_ty.is_some() {
                return Err(syn::Error::new(
                    kv.key.span(),
                    "duplicate key 'id' in attribute",
                ));
            }
            id_ty = Some(kv.ty);
        }

        Ok(Self { id_ty })
    }
}

struct KvType {
    key: syn::Ident,
    ty: Type,
}

impl Parse for KvType {
    fn parse(input: ParseStream) -> Result<Self> {
        let key = input.parse()?;
        let _eq: Token![=] = input.parse()?;
        let ty = input.parse()?;
        Ok(Self { key, ty })
    }
}
